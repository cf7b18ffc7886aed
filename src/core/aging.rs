//! Semi-empirical cycle aging model.
//!
//! The capacity loss of a single event is the product of a stress factor, which depends on the
//! depth and the average level of the state-of-charge swing, the Arrhenius temperature factor,
//! and the charge throughput of the event.

use serde::{Deserialize, Serialize};

use crate::{
    core::{battery::BatteryState, error::ValidationError, event::Event},
    quantity::{charge::AmpereHours, temperature::Kelvin},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgingModel {
    /// Stress coefficients `[k0, k1, k2, k3]` of
    /// `k0 · deviation · exp(k1 · average) + k2 · exp(k3 · deviation)`.
    pub coefficients: [f64; 4],

    /// Activation energy, J/mol.
    pub activation_energy: f64,

    /// Universal gas constant, J/(mol·K).
    pub gas_constant: f64,

    pub reference_temperature: Kelvin,
}

impl AgingModel {
    pub const REFERENCE: Self = Self {
        coefficients: [-4.092e-4, -2.167, 1.408e-5, 6.130],
        activation_energy: 78060.0,
        gas_constant: 8.314,
        reference_temperature: Kelvin(298.15),
    };
}

impl Default for AgingModel {
    fn default() -> Self {
        Self::REFERENCE
    }
}

impl AgingModel {
    /// Incremental capacity loss caused by the event.
    ///
    /// The direction of the event does not matter, only the depth and level of the swing.
    pub fn fade(
        &self,
        event: &Event,
        battery: &BatteryState,
        temperature: Kelvin,
    ) -> Result<AmpereHours, ValidationError> {
        let swing = Swing::try_from(event)?;
        let throughput = battery.capacity().throughput(swing.depth());
        Ok(throughput * (self.stress(swing) * self.arrhenius(temperature)))
    }

    #[must_use]
    pub fn stress(&self, swing: Swing) -> f64 {
        let [k0, k1, k2, k3] = self.coefficients;
        k0 * swing.deviation * (k1 * swing.average).exp() + k2 * (k3 * swing.deviation).exp()
    }

    #[must_use]
    pub fn arrhenius(&self, temperature: Kelvin) -> f64 {
        let reciprocal_difference =
            temperature.reciprocal() - self.reference_temperature.reciprocal();
        (-(self.activation_energy / self.gas_constant) * reciprocal_difference).exp()
    }
}

/// Check that the ambient temperature is physically meaningful.
pub fn validate_temperature(temperature: Kelvin) -> Result<(), ValidationError> {
    if temperature.is_finite() && temperature.0 > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidTemperature { kelvins: temperature.0 })
    }
}

/// State-of-charge swing of a single event.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Swing {
    /// Mean state of charge over the event, `0..=1`.
    pub average: f64,

    /// Half of the swing depth.
    pub deviation: f64,
}

impl Swing {
    #[must_use]
    pub const fn depth(self) -> f64 {
        2.0 * self.deviation
    }
}

impl TryFrom<&Event> for Swing {
    type Error = ValidationError;

    fn try_from(event: &Event) -> Result<Self, Self::Error> {
        for value in [event.soc_start, event.soc_end] {
            // Also catches `NaN`:
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::StateOfChargeOutOfRange {
                    vehicle: event.vehicle_id,
                    event: event.id,
                    value,
                });
            }
        }
        Ok(Self {
            average: (event.soc_start + event.soc_end) / 2.0,
            deviation: (event.soc_end - event.soc_start).abs() / 2.0,
        })
    }
}
