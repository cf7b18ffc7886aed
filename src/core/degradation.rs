use itertools::Itertools;

use crate::{
    core::{
        aging::AgingModel,
        battery::BatteryState,
        diagnostics::{Diagnostic, Diagnostics},
        error::ValidationError,
        event::{Event, weekly_cycle},
        fleet::{Fleet, Vehicle},
    },
    prelude::*,
    quantity::temperature::Kelvin,
};

pub const WEEKS_PER_YEAR: usize = 52;

/// Vehicle together with its battery state and recorded duty cycle.
#[must_use]
#[derive(Clone, Debug)]
pub struct TrackedVehicle {
    pub vehicle: Vehicle,
    pub battery: BatteryState,

    /// Recorded charging events, in feed order, possibly with duplicates.
    pub charging_events: Vec<Event>,
}

impl TrackedVehicle {
    /// Start tracking every vehicle of the fleet with a fresh battery.
    ///
    /// Events are grouped by vehicle. Driving events are not replayed, only counted. An event
    /// referring to an unregistered vehicle is a validation error. A vehicle with nothing to replay
    /// once the week boundary event is dropped is only a diagnostic.
    #[instrument(skip_all)]
    pub fn track_fleet(
        fleet: &Fleet,
        events: impl IntoIterator<Item = Event>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Self>, ValidationError> {
        let mut events_by_vehicle = events.into_iter().into_group_map_by(|event| event.vehicle_id);
        if let Some(event) = events_by_vehicle
            .iter()
            .filter(|(vehicle_id, _)| fleet.vehicle(**vehicle_id).is_none())
            .flat_map(|(_, events)| events)
            .min_by_key(|event| event.id)
        {
            return Err(ValidationError::UnknownVehicle { event: event.id, vehicle: event.vehicle_id });
        }

        let mut vehicles = Vec::with_capacity(fleet.vehicles().len());
        for vehicle in fleet.vehicles() {
            let vehicle_type = fleet.vehicle_type(vehicle.vehicle_type_id).ok_or(
                ValidationError::UnknownVehicleType {
                    vehicle: vehicle.id,
                    vehicle_type: vehicle.vehicle_type_id,
                },
            )?;
            let events = events_by_vehicle.remove(&vehicle.id).unwrap_or_default();
            let n_events = events.len();
            let charging_events = events.into_iter().filter(Event::is_charging).collect_vec();
            debug!(
                vehicle_id = %vehicle.id,
                n_driving_events = n_events - charging_events.len(),
                n_charging_events = charging_events.len(),
                "tracking",
            );
            if weekly_cycle(&charging_events).is_empty() {
                diagnostics.record(Diagnostic::NoChargingEvents { vehicle: vehicle.id });
            }
            if vehicle.depot_id.is_none() {
                diagnostics.record(Diagnostic::UnassignedVehicle { vehicle: vehicle.id });
            }
            vehicles.push(Self {
                vehicle: *vehicle,
                battery: BatteryState::new(vehicle_type),
                charging_events,
            });
        }
        Ok(vehicles)
    }
}

/// Replays the recorded week of every vehicle over one year.
#[must_use]
#[derive(Copy, Clone)]
pub struct YearlyDegradation<'a> {
    pub aging_model: &'a AgingModel,
    pub temperature: Kelvin,
}

impl YearlyDegradation<'_> {
    /// Simulate one year for all the vehicles, and then make all of them one year older.
    ///
    /// On error, the vehicle states are left partially updated and must be discarded.
    pub fn simulate_year(
        self,
        vehicles: &mut [TrackedVehicle],
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ValidationError> {
        for tracked in vehicles.iter_mut() {
            let n_clamped = self.simulate_vehicle_year(tracked)?;
            if n_clamped != 0 {
                diagnostics.record(Diagnostic::NegativeFadeClamped {
                    vehicle: tracked.vehicle.id,
                    year: tracked.battery.age() + 1,
                    n_events: n_clamped,
                });
            }
        }
        for tracked in vehicles {
            tracked.battery.advance_year();
        }
        Ok(())
    }

    /// Apply the weekly cycle [`WEEKS_PER_YEAR`] times and return the number of clamped events.
    fn simulate_vehicle_year(self, tracked: &mut TrackedVehicle) -> Result<usize, ValidationError> {
        let cycle = weekly_cycle(&tracked.charging_events);
        let mut n_clamped = 0;
        for _ in 0..WEEKS_PER_YEAR {
            for event in &cycle {
                let fade = self.aging_model.fade(event, &tracked.battery, self.temperature)?;
                if tracked.battery.apply_fade(fade) {
                    n_clamped += 1;
                }
            }
        }
        Ok(n_clamped)
    }
}
