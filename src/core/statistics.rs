use std::collections::BTreeMap;

use average::{Estimate, Mean};
use serde::{Deserialize, Serialize};

use crate::core::{
    degradation::TrackedVehicle,
    id::{DepotId, VehicleTypeId},
};

/// Mean fade ratios of one simulated year.
///
/// Only the vehicles housed in a depot are taken into account. Groups without vehicles have no
/// entry.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct YearlyStatistics {
    pub year: u32,

    /// Mean fade ratio across all the vehicles of each depot.
    pub by_depot: BTreeMap<DepotId, f64>,

    /// Mean fade ratio across all the vehicles of each type.
    pub by_vehicle_type: BTreeMap<VehicleTypeId, f64>,

    /// Mean fade ratio across the whole housed fleet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet: Option<f64>,
}

impl YearlyStatistics {
    /// Aggregate the current fade ratios of the vehicles.
    pub fn collect(year: u32, vehicles: &[TrackedVehicle]) -> Self {
        let mut by_depot = BTreeMap::<_, Mean>::new();
        let mut by_vehicle_type = BTreeMap::<_, Mean>::new();
        let mut fleet = Mean::new();

        for (cohort, fade_ratio) in vehicles.iter().filter_map(|tracked| {
            Some((tracked.vehicle.cohort()?, tracked.battery.cumulative_fade_ratio()))
        }) {
            by_depot.entry(cohort.depot_id).or_insert_with(Mean::new).add(fade_ratio);
            by_vehicle_type.entry(cohort.vehicle_type_id).or_insert_with(Mean::new).add(fade_ratio);
            fleet.add(fade_ratio);
        }

        Self {
            year,
            by_depot: by_depot.into_iter().map(|(id, mean)| (id, mean.mean())).collect(),
            by_vehicle_type: by_vehicle_type
                .into_iter()
                .map(|(id, mean)| (id, mean.mean()))
                .collect(),
            fleet: if fleet.is_empty() { None } else { Some(fleet.mean()) },
        }
    }
}
