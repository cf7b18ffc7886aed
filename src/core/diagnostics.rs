use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    core::id::{DepotId, VehicleId, VehicleTypeId},
    prelude::*,
};

/// Non-fatal data sparsity condition observed during a run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "condition", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// The vehicle has no charging events, its battery does not age.
    NoChargingEvents { vehicle: VehicleId },

    /// The vehicle has no home depot and is left out of the per-depot statistics.
    UnassignedVehicle { vehicle: VehicleId },

    /// No vehicles of the type are housed in the depot.
    EmptyCohort { depot: DepotId, vehicle_type: VehicleTypeId },

    /// Some events produced negative stress and were applied as zero fade.
    NegativeFadeClamped { vehicle: VehicleId, year: u32, n_events: usize },

    /// The cohort wears out within its first year, so there is no steady state to distribute.
    NoSteadyState { depot: DepotId, vehicle_type: VehicleTypeId, end_of_life_age: u32 },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoChargingEvents { vehicle } => {
                write!(f, "vehicle #{vehicle} has no charging events")
            }
            Self::UnassignedVehicle { vehicle } => {
                write!(f, "vehicle #{vehicle} has no assigned depot")
            }
            Self::EmptyCohort { depot, vehicle_type } => {
                write!(f, "depot #{depot} has no vehicles of type #{vehicle_type}")
            }
            Self::NegativeFadeClamped { vehicle, year, n_events } => {
                write!(
                    f,
                    "{n_events} events of vehicle #{vehicle} produced negative stress in year {year}"
                )
            }
            Self::NoSteadyState { depot, vehicle_type, end_of_life_age } => {
                write!(
                    f,
                    "vehicle type #{vehicle_type} in depot #{depot} reaches its end of life at age \
                     {end_of_life_age}, no steady state"
                )
            }
        }
    }
}

/// Collected data sparsity conditions, in the order of observation.
#[must_use]
#[derive(Clone, Debug, Default, Deserialize, Serialize, derive_more::IntoIterator)]
#[serde(transparent)]
pub struct Diagnostics(#[into_iterator(owned, ref)] Vec<Diagnostic>);

impl Diagnostics {
    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    #[cfg(test)]
    #[must_use]
    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.0.contains(diagnostic)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ok() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());
        diagnostics.record(Diagnostic::NoChargingEvents { vehicle: VehicleId(42) });
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.contains(&Diagnostic::NoChargingEvents { vehicle: VehicleId(42) }));
    }

    #[test]
    fn display_ok() {
        let diagnostic = Diagnostic::EmptyCohort { depot: DepotId(1), vehicle_type: VehicleTypeId(2) };
        assert_eq!(diagnostic.to_string(), "depot #1 has no vehicles of type #2");
    }

    #[test]
    fn serialize_tagged() {
        let diagnostic = Diagnostic::UnassignedVehicle { vehicle: VehicleId(7) };
        assert_eq!(
            serde_json::to_string(&diagnostic).unwrap(),
            r#"{"condition":"unassigned-vehicle","vehicle":7}"#,
        );
    }
}
