use std::{ffi::OsStr, fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        aging::AgingModel,
        error::ValidationError,
        event::Event,
        fleet::{Depot, Fleet, Vehicle, VehicleType},
        id::VehicleTypeId,
    },
    prelude::*,
};

/// Self-contained simulation input: registries, event feed, and optional model coefficients.
#[must_use]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub aging_model: AgingModel,

    pub vehicle_types: Vec<VehicleType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vehicle_type_variants: Vec<VehicleTypeVariant>,

    #[serde(default)]
    pub depots: Vec<Depot>,

    #[serde(default)]
    pub vehicles: Vec<Vehicle>,

    #[serde(default)]
    pub events: Vec<Event>,
}

/// Vehicle type derived from another one by scaling its capacities.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VehicleTypeVariant {
    pub base: VehicleTypeId,
    pub id: VehicleTypeId,
    pub suffix: String,
    pub capacity_factor: f64,
}

impl Scenario {
    /// Read the scenario as TOML when the path has the `.toml` extension, and as JSON otherwise.
    #[instrument(name = "reading the scenario…")]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let this = if path.extension() == Some(OsStr::new("toml")) {
            Self::from_toml(&contents)
        } else {
            Self::from_json(&contents)
        }
        .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(
            n_vehicle_types = this.vehicle_types.len(),
            n_variants = this.vehicle_type_variants.len(),
            n_depots = this.depots.len(),
            n_vehicles = this.vehicles.len(),
            n_events = this.events.len(),
            "loaded",
        );
        Ok(this)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Declared vehicle types followed by their variants.
    pub fn resolve_vehicle_types(&self) -> Result<Vec<VehicleType>, ValidationError> {
        let mut vehicle_types = self.vehicle_types.clone();
        for variant in &self.vehicle_type_variants {
            let base = self
                .vehicle_types
                .iter()
                .find(|vehicle_type| vehicle_type.id == variant.base)
                .ok_or(ValidationError::UnknownBaseVehicleType {
                    variant: variant.id,
                    base: variant.base,
                })?;
            vehicle_types.push(
                base.variant()
                    .id(variant.id)
                    .suffix(&variant.suffix)
                    .capacity_factor(variant.capacity_factor)
                    .call()?,
            );
        }
        Ok(vehicle_types)
    }

    /// Build and cross-check the registries.
    pub fn fleet(&self) -> Result<Fleet, ValidationError> {
        Fleet::builder()
            .vehicle_types(self.resolve_vehicle_types()?)
            .depots(self.depots.clone())
            .vehicles(self.vehicles.clone())
            .build()
    }
}
