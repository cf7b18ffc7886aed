//! Registries of vehicle types, depots and vehicles, as supplied by the scenario.

use std::collections::{BTreeMap, btree_map::Entry};

use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        error::ValidationError,
        id::{DepotId, VehicleId, VehicleTypeId},
    },
    prelude::*,
    quantity::{Zero, charge::AmpereHours, energy::KilowattHours},
};

#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VehicleType {
    pub id: VehicleTypeId,

    pub name: String,

    /// Nominal usable battery capacity.
    #[serde(rename = "battery_capacity_kwh")]
    pub battery_capacity: KilowattHours,

    /// Reserve capacity on top of the usable one.
    #[serde(rename = "battery_capacity_reserve_kwh")]
    pub battery_capacity_reserve: KilowattHours,
}

impl VehicleType {
    pub fn full_capacity(&self) -> KilowattHours {
        self.battery_capacity + self.battery_capacity_reserve
    }

    /// Full capacity expressed as charge, the nominal reference of the aging model.
    pub fn nominal_charge(&self) -> AmpereHours {
        AmpereHours::from(self.full_capacity())
    }

    /// Usable capacity expressed as charge.
    pub fn usable_charge(&self) -> AmpereHours {
        AmpereHours::from(self.battery_capacity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason| ValidationError::InvalidCapacity { vehicle_type: self.id, reason };
        if !self.battery_capacity.is_finite() || self.battery_capacity <= KilowattHours::ZERO {
            return Err(invalid("usable capacity must be positive"));
        }
        if !self.battery_capacity_reserve.is_finite()
            || self.battery_capacity_reserve < KilowattHours::ZERO
        {
            return Err(invalid("reserve capacity must not be negative"));
        }
        Ok(())
    }
}

#[bon]
impl VehicleType {
    /// Derive a new vehicle type with both capacities scaled by `capacity_factor`.
    ///
    /// The variant is named after the base type with the suffix in parentheses, for example
    /// `EN (young)`.
    #[builder]
    pub fn variant(
        &self,
        id: VehicleTypeId,
        suffix: &str,
        capacity_factor: f64,
    ) -> Result<Self, ValidationError> {
        if !(capacity_factor > 0.0 && capacity_factor <= 1.0) {
            return Err(ValidationError::InvalidCapacityFactor { variant: id, factor: capacity_factor });
        }
        Ok(Self {
            id,
            name: format!("{} ({suffix})", self.name),
            battery_capacity: self.battery_capacity * capacity_factor,
            battery_capacity_reserve: self.battery_capacity_reserve * capacity_factor,
        })
    }
}

#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Depot {
    pub id: DepotId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

impl Depot {
    /// Short name if there is one, full name otherwise.
    pub fn label(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct Vehicle {
    pub id: VehicleId,

    #[serde(rename = "vehicle_type")]
    pub vehicle_type_id: VehicleTypeId,

    /// Home depot, pre-computed from the vehicle's routes.
    #[serde(rename = "depot", default, skip_serializing_if = "Option::is_none")]
    pub depot_id: Option<DepotId>,
}

impl Vehicle {
    pub fn cohort(&self) -> Option<Cohort> {
        self.depot_id.map(|depot_id| Cohort { depot_id, vehicle_type_id: self.vehicle_type_id })
    }
}

/// Vehicles of the same type housed in the same depot.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Cohort {
    #[serde(rename = "depot")]
    pub depot_id: DepotId,

    #[serde(rename = "vehicle_type")]
    pub vehicle_type_id: VehicleTypeId,
}

/// Statically typed registries of the simulated scenario.
#[must_use]
#[derive(Debug, Default)]
pub struct Fleet {
    vehicle_types: BTreeMap<VehicleTypeId, VehicleType>,
    depots: BTreeMap<DepotId, Depot>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
}

#[bon]
impl Fleet {
    /// Build the registries and check the cross-references.
    ///
    /// Repeated depots and vehicles are de-duplicated by identifier, the first occurrence wins.
    #[builder]
    pub fn new(
        vehicle_types: Vec<VehicleType>,
        depots: Vec<Depot>,
        vehicles: Vec<Vehicle>,
    ) -> Result<Self, ValidationError> {
        let mut this = Self::default();

        for vehicle_type in vehicle_types {
            vehicle_type.validate()?;
            match this.vehicle_types.entry(vehicle_type.id) {
                Entry::Vacant(entry) => {
                    entry.insert(vehicle_type);
                }
                Entry::Occupied(entry) => {
                    return Err(ValidationError::DuplicateVehicleType { vehicle_type: *entry.key() });
                }
            }
        }
        for depot in depots {
            this.depots.entry(depot.id).or_insert(depot);
        }
        for vehicle in vehicles {
            if !this.vehicle_types.contains_key(&vehicle.vehicle_type_id) {
                return Err(ValidationError::UnknownVehicleType {
                    vehicle: vehicle.id,
                    vehicle_type: vehicle.vehicle_type_id,
                });
            }
            if let Some(depot_id) = vehicle.depot_id
                && !this.depots.contains_key(&depot_id)
            {
                return Err(ValidationError::UnknownDepot { vehicle: vehicle.id, depot: depot_id });
            }
            this.vehicles.entry(vehicle.id).or_insert(vehicle);
        }

        debug!(
            n_vehicle_types = this.vehicle_types.len(),
            n_depots = this.depots.len(),
            n_vehicles = this.vehicles.len(),
            "registries are ready",
        );
        Ok(this)
    }
}

impl Fleet {
    pub fn vehicle_types(&self) -> impl ExactSizeIterator<Item = &VehicleType> {
        self.vehicle_types.values()
    }

    pub fn depots(&self) -> impl ExactSizeIterator<Item = &Depot> {
        self.depots.values()
    }

    pub fn vehicles(&self) -> impl ExactSizeIterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    #[must_use]
    pub fn vehicle_type(&self, id: VehicleTypeId) -> Option<&VehicleType> {
        self.vehicle_types.get(&id)
    }

    #[must_use]
    pub fn depot(&self, id: DepotId) -> Option<&Depot> {
        self.depots.get(&id)
    }

    #[must_use]
    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// All depot and vehicle type combinations, depot-major, in identifier order.
    pub fn cohorts(&self) -> impl Iterator<Item = Cohort> {
        self.depots.keys().copied().flat_map(|depot_id| {
            self.vehicle_types
                .keys()
                .map(move |vehicle_type_id| Cohort { depot_id, vehicle_type_id: *vehicle_type_id })
        })
    }

    /// Vehicles of the cohort in identifier order.
    pub fn members(&self, cohort: Cohort) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().filter(move |vehicle| vehicle.cohort() == Some(cohort))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn vehicle_type(id: u64, battery_capacity: f64) -> VehicleType {
        VehicleType {
            id: VehicleTypeId(id),
            name: format!("VT{id}"),
            battery_capacity: KilowattHours(battery_capacity),
            battery_capacity_reserve: KilowattHours(battery_capacity * 0.1),
        }
    }

    pub fn depot(id: u64) -> Depot {
        Depot { id: DepotId(id), name: format!("Depot at Betriebshof {id}"), short_name: None }
    }

    pub fn vehicle(id: u64, vehicle_type: u64, depot: Option<u64>) -> Vehicle {
        Vehicle {
            id: VehicleId(id),
            vehicle_type_id: VehicleTypeId(vehicle_type),
            depot_id: depot.map(DepotId),
        }
    }

    #[test]
    fn full_capacity_ok() {
        let vehicle_type = vehicle_type(1, 320.0);
        assert_eq!(vehicle_type.full_capacity(), KilowattHours(352.0));
        assert_eq!(vehicle_type.nominal_charge(), AmpereHours(550.0));
        assert_eq!(vehicle_type.usable_charge(), AmpereHours(500.0));
    }

    #[test]
    fn variant_scales_capacities() {
        let base = vehicle_type(1, 400.0);
        let young = base
            .variant()
            .id(VehicleTypeId(11))
            .suffix("young")
            .capacity_factor(0.9)
            .call()
            .unwrap();
        assert_eq!(young.id, VehicleTypeId(11));
        assert_eq!(young.name, "VT1 (young)");
        assert_eq!(young.battery_capacity, KilowattHours(400.0 * 0.9));
        assert_eq!(young.battery_capacity_reserve, KilowattHours(40.0 * 0.9));
        assert_eq!(base.battery_capacity, KilowattHours(400.0));
    }

    #[test]
    fn variant_rejects_invalid_factor() {
        let result = vehicle_type(1, 400.0)
            .variant()
            .id(VehicleTypeId(12))
            .suffix("old")
            .capacity_factor(1.5)
            .call();
        assert!(matches!(result, Err(ValidationError::InvalidCapacityFactor { .. })));
    }

    #[test]
    fn depot_label_falls_back_to_name() {
        let mut depot = depot(1);
        assert_eq!(depot.label(), "Depot at Betriebshof 1");
        depot.short_name = Some("BF 1".to_string());
        assert_eq!(depot.label(), "BF 1");
    }

    #[test]
    fn unknown_vehicle_type_is_rejected() {
        let result = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 300.0)])
            .depots(vec![depot(1)])
            .vehicles(vec![vehicle(1, 2, Some(1))])
            .build();
        assert_eq!(
            result.unwrap_err(),
            ValidationError::UnknownVehicleType {
                vehicle: VehicleId(1),
                vehicle_type: VehicleTypeId(2)
            },
        );
    }

    #[test]
    fn unknown_depot_is_rejected() {
        let result = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 300.0)])
            .depots(vec![depot(1)])
            .vehicles(vec![vehicle(1, 1, Some(2))])
            .build();
        assert!(matches!(result, Err(ValidationError::UnknownDepot { .. })));
    }

    #[test]
    fn invalid_capacity_is_rejected() {
        let result = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 0.0)])
            .depots(vec![])
            .vehicles(vec![])
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidCapacity { .. })));
    }

    #[test]
    fn duplicate_vehicles_keep_first() {
        let fleet = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 300.0), vehicle_type(2, 300.0)])
            .depots(vec![depot(1)])
            .vehicles(vec![vehicle(1, 1, Some(1)), vehicle(1, 2, None)])
            .build()
            .unwrap();
        assert_eq!(fleet.vehicles().len(), 1);
        assert_eq!(fleet.vehicle(VehicleId(1)).unwrap().vehicle_type_id, VehicleTypeId(1));
    }

    #[test]
    fn cohorts_and_members() {
        let fleet = Fleet::builder()
            .vehicle_types(vec![vehicle_type(1, 300.0), vehicle_type(2, 300.0)])
            .depots(vec![depot(1), depot(2)])
            .vehicles(vec![vehicle(1, 1, Some(1)), vehicle(2, 1, Some(1)), vehicle(3, 2, None)])
            .build()
            .unwrap();
        assert_eq!(fleet.cohorts().count(), 4);
        let cohort = Cohort { depot_id: DepotId(1), vehicle_type_id: VehicleTypeId(1) };
        assert_eq!(fleet.members(cohort).count(), 2);
        let empty = Cohort { depot_id: DepotId(2), vehicle_type_id: VehicleTypeId(2) };
        assert_eq!(fleet.members(empty).count(), 0);
    }
}
