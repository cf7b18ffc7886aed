use thiserror::Error;

use crate::core::id::{DepotId, EventId, VehicleId, VehicleTypeId};

/// Malformed input that aborts the simulation run.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("state of charge {value} of event #{event} (vehicle #{vehicle}) is outside `0..=1`")]
    StateOfChargeOutOfRange { vehicle: VehicleId, event: EventId, value: f64 },

    #[error("vehicle #{vehicle} refers to unknown vehicle type #{vehicle_type}")]
    UnknownVehicleType { vehicle: VehicleId, vehicle_type: VehicleTypeId },

    #[error("vehicle #{vehicle} refers to unknown depot #{depot}")]
    UnknownDepot { vehicle: VehicleId, depot: DepotId },

    #[error("event #{event} refers to unknown vehicle #{vehicle}")]
    UnknownVehicle { event: EventId, vehicle: VehicleId },

    #[error("variant #{variant} refers to unknown base vehicle type #{base}")]
    UnknownBaseVehicleType { variant: VehicleTypeId, base: VehicleTypeId },

    #[error("vehicle type #{vehicle_type} is registered more than once")]
    DuplicateVehicleType { vehicle_type: VehicleTypeId },

    #[error("vehicle type #{vehicle_type} has an invalid battery capacity: {reason}")]
    InvalidCapacity { vehicle_type: VehicleTypeId, reason: &'static str },

    #[error("capacity factor {factor} of variant #{variant} is outside `(0, 1]`")]
    InvalidCapacityFactor { variant: VehicleTypeId, factor: f64 },

    #[error("ambient temperature must be a positive number of kelvins, got {kelvins}")]
    InvalidTemperature { kelvins: f64 },

    #[error("simulation horizon must be at least one year")]
    EmptyHorizon,

    #[error("no steady state is possible for end-of-life age {end_of_life_age}")]
    NoSteadyState { end_of_life_age: u32 },
}
