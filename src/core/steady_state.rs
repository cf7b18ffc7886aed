//! Fleet age structure under continuous replacement at the end-of-life age.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        diagnostics::{Diagnostic, Diagnostics},
        error::ValidationError,
        fleet::{Cohort, Fleet},
        id::VehicleId,
        simulation::EndOfLifeAges,
    },
    prelude::*,
};

/// Number of vehicles in each age bucket, youngest first.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AgeDistribution(Vec<usize>);

impl AgeDistribution {
    /// Spread the fleet evenly over the ages `0..end_of_life_age - 1`.
    ///
    /// The remainder goes to the youngest buckets, one vehicle each.
    pub fn try_new(fleet_size: usize, end_of_life_age: u32) -> Result<Self, ValidationError> {
        if end_of_life_age <= 1 {
            return Err(ValidationError::NoSteadyState { end_of_life_age });
        }
        let n_buckets = (end_of_life_age - 1) as usize;
        let base = fleet_size / n_buckets;
        let remainder = fleet_size % n_buckets;
        Ok(Self((0..n_buckets).map(|age| if age < remainder { base + 1 } else { base }).collect()))
    }

    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn fleet_size(&self) -> usize {
        self.0.iter().sum()
    }

    /// Age of every vehicle slot, youngest first.
    pub fn ages(&self) -> impl Iterator<Item = u32> {
        (0_u32..).zip(&self.0).flat_map(|(age, count)| std::iter::repeat_n(age, *count))
    }
}

/// Steady-state distribution of a single cohort.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CohortDistribution {
    pub cohort: Cohort,
    pub end_of_life_age: u32,

    /// Empty when the cohort has no steady state.
    pub distribution: AgeDistribution,
}

/// Steady-state age distributions of all populated cohorts.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SteadyStatePlan {
    pub cohorts: Vec<CohortDistribution>,
}

impl SteadyStatePlan {
    /// Distribute the vehicles of every cohort with a defined end-of-life age.
    ///
    /// A cohort that wears out within its first year gets an empty distribution and a diagnostic.
    #[instrument(skip_all)]
    pub fn build(
        fleet: &Fleet,
        end_of_life: &EndOfLifeAges,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut cohorts = Vec::new();
        for (cohort, end_of_life_age) in end_of_life.iter() {
            let fleet_size = fleet.members(cohort).count();
            let distribution = AgeDistribution::try_new(fleet_size, end_of_life_age)
                .unwrap_or_else(|_| {
                    diagnostics.record(Diagnostic::NoSteadyState {
                        depot: cohort.depot_id,
                        vehicle_type: cohort.vehicle_type_id,
                        end_of_life_age,
                    });
                    AgeDistribution::default()
                });
            debug!(?cohort, fleet_size, end_of_life_age, ?distribution, "distributed");
            cohorts.push(CohortDistribution { cohort, end_of_life_age, distribution });
        }
        Self { cohorts }
    }

    /// Assign a steady-state age to the vehicles of each planned cohort.
    ///
    /// Vehicles in identifier order fill the buckets from age zero upwards. Vehicles of cohorts
    /// without a steady state get no age.
    #[must_use]
    pub fn assign_ages(&self, fleet: &Fleet) -> BTreeMap<VehicleId, u32> {
        self.cohorts
            .iter()
            .flat_map(|planned| {
                fleet
                    .members(planned.cohort)
                    .map(|vehicle| vehicle.id)
                    .zip(planned.distribution.ages())
            })
            .collect()
    }
}
