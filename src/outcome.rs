//! JSON persistence of the simulation outcome.
//!
//! The arrays are stored as nested lists in `[depot][vehicle_type][year]` order, next to the
//! explicit axis keys. Missing cells are stored as `null`, distinct from zero.

use std::{fmt::Debug, fs, path::Path};

use itertools::Itertools;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        diagnostics::Diagnostics,
        id::{DepotId, VehicleTypeId},
        simulation::{Axes, EndOfLifeAges, FadeTable, Outcome},
        statistics::YearlyStatistics,
    },
    prelude::*,
};

#[derive(Deserialize, Serialize)]
struct OutcomeRecord {
    depots: Vec<DepotId>,
    vehicle_types: Vec<VehicleTypeId>,
    years: u32,
    fade: Vec<Vec<Vec<Option<f64>>>>,
    end_of_life: Vec<Vec<Option<u32>>>,

    #[serde(default)]
    statistics: Vec<YearlyStatistics>,

    #[serde(default)]
    diagnostics: Diagnostics,
}

impl From<&Outcome> for OutcomeRecord {
    fn from(outcome: &Outcome) -> Self {
        let axes = outcome.fade.axes();
        Self {
            depots: axes.depots.clone(),
            vehicle_types: axes.vehicle_types.clone(),
            years: outcome.fade.years(),
            fade: outcome
                .fade
                .cells()
                .outer_iter()
                .map(|by_depot| by_depot.outer_iter().map(|row| row.to_vec()).collect())
                .collect(),
            end_of_life: outcome.end_of_life.cells().outer_iter().map(|row| row.to_vec()).collect(),
            statistics: outcome.statistics.clone(),
            diagnostics: outcome.diagnostics.clone(),
        }
    }
}

impl TryFrom<OutcomeRecord> for Outcome {
    type Error = Error;

    fn try_from(record: OutcomeRecord) -> Result<Self> {
        ensure!(
            record.depots.iter().tuple_windows().all(|(lhs, rhs)| lhs < rhs),
            "depot keys must be unique and sorted",
        );
        ensure!(
            record.vehicle_types.iter().tuple_windows().all(|(lhs, rhs)| lhs < rhs),
            "vehicle type keys must be unique and sorted",
        );
        let n_depots = record.depots.len();
        let n_vehicle_types = record.vehicle_types.len();
        let n_years = record.years as usize + 1;
        ensure!(record.fade.len() == n_depots, "fade table must have a row per depot");
        ensure!(
            record.fade.iter().flatten().all(|row| row.len() == n_years),
            "fade table must have a column per year",
        );
        ensure!(
            record.fade.iter().all(|by_depot| by_depot.len() == n_vehicle_types),
            "fade table must have a row per vehicle type",
        );

        let axes = Axes { depots: record.depots, vehicle_types: record.vehicle_types };
        let fade = Array3::from_shape_vec(
            (n_depots, n_vehicle_types, n_years),
            record.fade.into_iter().flatten().flatten().collect(),
        )?;
        let fade = FadeTable::from_cells(axes.clone(), fade).context("malformed fade table")?;

        ensure!(
            record.end_of_life.iter().all(|row| row.len() == n_vehicle_types),
            "end-of-life table must have a column per vehicle type",
        );
        let end_of_life = Array2::from_shape_vec(
            (record.end_of_life.len(), n_vehicle_types),
            record.end_of_life.into_iter().flatten().collect(),
        )?;
        let end_of_life =
            EndOfLifeAges::from_cells(axes, end_of_life).context("malformed end-of-life table")?;

        Ok(Self {
            fade,
            end_of_life,
            statistics: record.statistics,
            diagnostics: record.diagnostics,
        })
    }
}

impl Outcome {
    #[instrument(name = "reading the outcome…")]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    #[instrument(skip(self), name = "writing the outcome…")]
    pub fn write_to<P: AsRef<Path> + Debug>(&self, path: P) -> Result {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str::<OutcomeRecord>(contents)?.try_into()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&OutcomeRecord::from(self))?)
    }
}
