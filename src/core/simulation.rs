use std::{collections::BTreeMap, time::Instant};

use average::{Estimate, Mean};
use bon::Builder;
use ndarray::{Array2, Array3, s};

use crate::{
    core::{
        aging::{AgingModel, validate_temperature},
        degradation::{TrackedVehicle, YearlyDegradation},
        diagnostics::{Diagnostic, Diagnostics},
        error::ValidationError,
        event::Event,
        fleet::{Cohort, Fleet},
        id::{DepotId, VehicleTypeId},
        statistics::YearlyStatistics,
    },
    fmt::FormattedPercentage,
    prelude::*,
    quantity::temperature::Kelvin,
};

pub const DEFAULT_HORIZON: u32 = 12;

/// Multi-year fleet degradation run.
#[must_use]
#[derive(Builder)]
pub struct Simulation<'a> {
    fleet: &'a Fleet,

    #[builder(default)]
    aging_model: AgingModel,

    /// Constant ambient temperature.
    #[builder(default = Kelvin::DEFAULT_AMBIENT)]
    temperature: Kelvin,

    /// Number of simulated years.
    #[builder(default = DEFAULT_HORIZON)]
    years: u32,
}

impl Simulation<'_> {
    /// Track every vehicle of the fleet over the horizon.
    ///
    /// Malformed input aborts the run, and no partial outcome is returned.
    #[instrument(skip_all, fields(years = self.years))]
    pub fn run(self, events: impl IntoIterator<Item = Event>) -> Result<Outcome, ValidationError> {
        validate_temperature(self.temperature)?;
        if self.years == 0 {
            return Err(ValidationError::EmptyHorizon);
        }
        let start_instant = Instant::now();

        let mut diagnostics = Diagnostics::default();
        let mut vehicles = TrackedVehicle::track_fleet(self.fleet, events, &mut diagnostics)?;
        for cohort in self.fleet.cohorts() {
            if self.fleet.members(cohort).next().is_none() {
                diagnostics.record(Diagnostic::EmptyCohort {
                    depot: cohort.depot_id,
                    vehicle_type: cohort.vehicle_type_id,
                });
            }
        }

        let mut statistics = vec![YearlyStatistics::collect(0, &vehicles)];

        let driver =
            YearlyDegradation { aging_model: &self.aging_model, temperature: self.temperature };
        for year in 1..=self.years {
            driver.simulate_year(&mut vehicles, &mut diagnostics)?;
            let yearly_statistics = YearlyStatistics::collect(year, &vehicles);
            info!(
                year,
                fleet_fade = ?yearly_statistics.fleet.map(FormattedPercentage),
                n_replacements = vehicles.iter().filter(|tracked| tracked.battery.needs_replacement()).count(),
                "simulated",
            );
            statistics.push(yearly_statistics);
        }

        for tracked in &vehicles {
            debug!(
                vehicle_id = %tracked.vehicle.id,
                age = tracked.battery.age(),
                state_of_health = ?FormattedPercentage(tracked.battery.state_of_health()),
                cumulative_fade = %tracked.battery.cumulative_fade(),
                yearly_state_of_health = ?tracked.battery.yearly_state_of_health(),
                "final state",
            );
        }

        let fade = FadeTable::collect(Axes::from(self.fleet), self.years, &vehicles);
        let end_of_life = EndOfLifeAges::scan(&fade);
        info!(elapsed = ?start_instant.elapsed(), n_diagnostics = diagnostics.len(), "done");
        Ok(Outcome { fade, end_of_life, statistics, diagnostics })
    }
}

/// Everything a simulation run produces.
#[must_use]
#[derive(Clone, Debug)]
pub struct Outcome {
    pub fade: FadeTable,
    pub end_of_life: EndOfLifeAges,

    /// Cohort statistics from year zero to the horizon.
    pub statistics: Vec<YearlyStatistics>,

    pub diagnostics: Diagnostics,
}

/// Depot and vehicle-type axes of the outcome tables, in identifier order.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Axes {
    pub depots: Vec<DepotId>,
    pub vehicle_types: Vec<VehicleTypeId>,
}

impl From<&Fleet> for Axes {
    fn from(fleet: &Fleet) -> Self {
        Self {
            depots: fleet.depots().map(|depot| depot.id).collect(),
            vehicle_types: fleet.vehicle_types().map(|vehicle_type| vehicle_type.id).collect(),
        }
    }
}

impl Axes {
    /// Array index of the cohort.
    #[must_use]
    pub fn position(&self, cohort: Cohort) -> Option<[usize; 2]> {
        Some([
            self.depots.binary_search(&cohort.depot_id).ok()?,
            self.vehicle_types.binary_search(&cohort.vehicle_type_id).ok()?,
        ])
    }

    /// All cohorts, depot-major.
    pub fn cohorts(&self) -> impl Iterator<Item = Cohort> {
        self.depots.iter().flat_map(|depot_id| {
            self.vehicle_types
                .iter()
                .map(|vehicle_type_id| Cohort { depot_id: *depot_id, vehicle_type_id: *vehicle_type_id })
        })
    }

    const fn shape(&self) -> (usize, usize) {
        (self.depots.len(), self.vehicle_types.len())
    }
}

/// Mean cumulative fade ratio at the start of each year, per depot and vehicle type.
///
/// Cells of cohorts without vehicles stay [`None`].
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct FadeTable {
    axes: Axes,

    /// `[depot, vehicle_type, year]`, years from zero to the horizon inclusive.
    cells: Array3<Option<f64>>,
}

impl FadeTable {
    /// Average the yearly fade ratio histories of each populated cohort.
    fn collect(axes: Axes, years: u32, vehicles: &[TrackedVehicle]) -> Self {
        let (n_depots, n_vehicle_types) = axes.shape();
        let n_years = years as usize + 1;
        let mut means = BTreeMap::<Cohort, Vec<Mean>>::new();
        for tracked in vehicles {
            if let Some(cohort) = tracked.vehicle.cohort() {
                let cohort_means =
                    means.entry(cohort).or_insert_with(|| vec![Mean::new(); n_years]);
                for (mean, fade_ratio) in cohort_means.iter_mut().zip(tracked.battery.yearly_fade_ratio()) {
                    mean.add(*fade_ratio);
                }
            }
        }
        let mut cells = Array3::from_elem((n_depots, n_vehicle_types, n_years), None);
        for (cohort, cohort_means) in means {
            if let Some([depot_index, vehicle_type_index]) = axes.position(cohort) {
                for (year_index, mean) in cohort_means.iter().enumerate() {
                    cells[[depot_index, vehicle_type_index, year_index]] = Some(mean.mean());
                }
            }
        }
        Self { axes, cells }
    }

    /// Assemble the table from previously computed cells.
    ///
    /// Returns [`None`] when the cell shape does not match the axes.
    pub fn from_cells(axes: Axes, cells: Array3<Option<f64>>) -> Option<Self> {
        let (n_depots, n_vehicle_types, n_years) = cells.dim();
        (axes.shape() == (n_depots, n_vehicle_types) && n_years != 0).then_some(Self { axes, cells })
    }

    pub const fn axes(&self) -> &Axes {
        &self.axes
    }

    pub const fn cells(&self) -> &Array3<Option<f64>> {
        &self.cells
    }

    /// Simulated horizon in years.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn years(&self) -> u32 {
        (self.cells.dim().2 - 1) as u32
    }

    #[must_use]
    pub fn get(&self, cohort: Cohort, year: u32) -> Option<f64> {
        let [depot_index, vehicle_type_index] = self.axes.position(cohort)?;
        *self.cells.get([depot_index, vehicle_type_index, year as usize])?
    }

    /// Whether the cohort has vehicles.
    #[must_use]
    pub fn is_populated(&self, cohort: Cohort) -> bool {
        self.get(cohort, 0).is_some()
    }
}

/// Age at which a cohort's state of health first drops below zero, per depot and vehicle type.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndOfLifeAges {
    axes: Axes,
    cells: Array2<Option<u32>>,
}

impl EndOfLifeAges {
    /// Scan every populated cohort from year zero.
    ///
    /// A cohort that survives the horizon gets the horizon as its end-of-life age.
    pub fn scan(fade: &FadeTable) -> Self {
        let years = fade.years();
        let cells = Array2::from_shape_fn(fade.axes.shape(), |(depot_index, vehicle_type_index)| {
            let row = fade.cells.slice(s![depot_index, vehicle_type_index, ..]);
            if row[0].is_none() {
                return None;
            }
            Some(
                (0..=years)
                    .zip(row.iter().copied())
                    .find_map(|(age, fade)| fade.filter(|fade| 1.0 - fade < 0.0).map(|_| age))
                    .unwrap_or(years),
            )
        });
        Self { axes: fade.axes.clone(), cells }
    }

    /// Assemble the table from previously computed cells.
    ///
    /// Returns [`None`] when the cell shape does not match the axes.
    pub fn from_cells(axes: Axes, cells: Array2<Option<u32>>) -> Option<Self> {
        (axes.shape() == cells.dim()).then_some(Self { axes, cells })
    }

    pub const fn axes(&self) -> &Axes {
        &self.axes
    }

    pub const fn cells(&self) -> &Array2<Option<u32>> {
        &self.cells
    }

    #[must_use]
    pub fn get(&self, cohort: Cohort) -> Option<u32> {
        let index = self.axes.position(cohort)?;
        self.cells[index]
    }

    /// Populated cohorts with their end-of-life ages, depot-major.
    pub fn iter(&self) -> impl Iterator<Item = (Cohort, u32)> {
        self.axes.cohorts().filter_map(|cohort| Some((cohort, self.get(cohort)?)))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use itertools::Itertools;

    use super::*;
    use crate::core::{
        degradation::tests::{single_vehicle_fleet, weekly_events},
        event::tests::charging_event,
        fleet::tests::{depot, vehicle, vehicle_type},
        id::VehicleId,
    };

    fn cohort(depot_id: u64, vehicle_type_id: u64) -> Cohort {
        Cohort { depot_id: DepotId(depot_id), vehicle_type_id: VehicleTypeId(vehicle_type_id) }
    }

    #[test]
    fn single_vehicle_over_twelve_years() {
        let fleet = single_vehicle_fleet();
        let run = || Simulation::builder().fleet(&fleet).build().run(weekly_events()).unwrap();
        let outcome = run();

        assert_eq!(outcome.fade.years(), 12);
        let row = (0..=12).map(|year| outcome.fade.get(cohort(1, 1), year).unwrap()).collect_vec();
        assert_eq!(row.len(), 13);
        assert_eq!(row[0], 0.0);
        assert!(row.iter().tuple_windows().all(|(previous, next)| next >= previous));
        assert!(row[1] > 0.0);
        assert_eq!(outcome.statistics.len(), 13);
        assert!(outcome.end_of_life.get(cohort(1, 1)).is_some());

        // Re-running must be bit-identical:
        assert_eq!(run().fade, outcome.fade);
        assert_eq!(run().end_of_life, outcome.end_of_life);
    }

    #[test]
    fn first_year_fade_matches_manual_replay() {
        let fleet = single_vehicle_fleet();
        let outcome =
            Simulation::builder().fleet(&fleet).years(1).build().run(weekly_events()).unwrap();

        let mut battery = crate::core::battery::BatteryState::new(&vehicle_type(1, 320.0));
        let event = charging_event(1, 0, 1.0, 0.5);
        for _ in 0..crate::core::degradation::WEEKS_PER_YEAR {
            battery.apply_fade(
                AgingModel::REFERENCE.fade(&event, &battery, Kelvin::DEFAULT_AMBIENT).unwrap(),
            );
        }
        assert_relative_eq!(
            outcome.fade.get(cohort(1, 1), 1).unwrap(),
            battery.cumulative_fade_ratio(),
        );
    }

    #[test]
    fn empty_cohorts_never_get_numbers() {
        let fleet = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 320.0), vehicle_type(2, 320.0)])
            .depots(vec![depot(1), depot(2)])
            .vehicles(vec![vehicle(1, 1, Some(1))])
            .build()
            .unwrap();
        let outcome =
            Simulation::builder().fleet(&fleet).years(3).build().run(weekly_events()).unwrap();

        assert_eq!(outcome.fade.get(cohort(1, 1), 0), Some(0.0));
        for empty in [cohort(1, 2), cohort(2, 1), cohort(2, 2)] {
            assert!(!outcome.fade.is_populated(empty));
            assert!((0..=3).all(|year| outcome.fade.get(empty, year).is_none()));
            assert_eq!(outcome.end_of_life.get(empty), None);
            assert!(outcome.diagnostics.contains(&Diagnostic::EmptyCohort {
                depot: empty.depot_id,
                vehicle_type: empty.vehicle_type_id,
            }));
        }
        assert_eq!(outcome.end_of_life.iter().collect_vec(), [(cohort(1, 1), 3)]);
    }

    #[test]
    fn unassigned_vehicle_is_simulated_but_not_aggregated() {
        let fleet = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 320.0)])
            .depots(vec![depot(1)])
            .vehicles(vec![vehicle(1, 1, None)])
            .build()
            .unwrap();
        let outcome =
            Simulation::builder().fleet(&fleet).years(1).build().run(weekly_events()).unwrap();
        assert!(!outcome.fade.is_populated(cohort(1, 1)));
        assert!(
            outcome.diagnostics.contains(&Diagnostic::UnassignedVehicle { vehicle: VehicleId(1) })
        );
    }

    #[test]
    fn end_of_life_is_the_first_negative_state_of_health() {
        let axes = Axes { depots: vec![DepotId(1)], vehicle_types: vec![VehicleTypeId(1)] };
        let cells = Array3::from_shape_vec(
            (1, 1, 5),
            vec![Some(0.0), Some(0.4), Some(1.0), Some(1.2), Some(1.5)],
        )
        .unwrap();
        let fade = FadeTable::from_cells(axes, cells).unwrap();
        // Exactly zero state of health is not the end of life yet:
        assert_eq!(EndOfLifeAges::scan(&fade).get(cohort(1, 1)), Some(3));
    }

    #[test]
    fn end_of_life_defaults_to_horizon() {
        let axes = Axes { depots: vec![DepotId(1)], vehicle_types: vec![VehicleTypeId(1)] };
        let cells = Array3::from_shape_vec((1, 1, 3), vec![Some(0.0), Some(0.1), Some(0.2)]).unwrap();
        let fade = FadeTable::from_cells(axes, cells).unwrap();
        assert_eq!(EndOfLifeAges::scan(&fade).get(cohort(1, 1)), Some(2));
    }

    #[test]
    fn from_cells_checks_shape() {
        let axes = Axes { depots: vec![DepotId(1)], vehicle_types: vec![VehicleTypeId(1)] };
        assert!(FadeTable::from_cells(axes.clone(), Array3::from_elem((2, 1, 3), None)).is_none());
        assert!(EndOfLifeAges::from_cells(axes, Array2::from_elem((1, 2), None)).is_none());
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let fleet = single_vehicle_fleet();
        let result = Simulation::builder().fleet(&fleet).years(0).build().run(weekly_events());
        assert_eq!(result.unwrap_err(), ValidationError::EmptyHorizon);
    }

    #[test]
    fn invalid_temperature_is_rejected() {
        let fleet = single_vehicle_fleet();
        let result = Simulation::builder()
            .fleet(&fleet)
            .temperature(Kelvin(-5.0))
            .build()
            .run(weekly_events());
        assert!(matches!(result, Err(ValidationError::InvalidTemperature { .. })));
    }

    #[test]
    fn malformed_event_aborts_the_run() {
        let fleet = single_vehicle_fleet();
        let events = vec![charging_event(1, 0, 0.3, -0.1), charging_event(2, 24 * 7, 0.5, 1.0)];
        let result = Simulation::builder().fleet(&fleet).build().run(events);
        assert!(matches!(result, Err(ValidationError::StateOfChargeOutOfRange { .. })));
    }
}
