use crate::quantity::energy::KilowattHours;

quantity!(AmpereHours, via: f64, suffix: "Ah", precision: 1);

/// Nominal cell voltage of the modelled traction battery.
pub const NOMINAL_CELL_VOLTAGE: f64 = 3.2;

/// Number of cells connected in series in the modelled traction battery.
pub const N_CELLS_IN_SERIES: f64 = 200.0;

impl From<KilowattHours> for AmpereHours {
    /// Convert the pack energy into the charge at the nominal pack voltage.
    fn from(energy: KilowattHours) -> Self {
        Self(energy.0 * 1000.0 / (NOMINAL_CELL_VOLTAGE * N_CELLS_IN_SERIES))
    }
}

impl AmpereHours {
    /// Charge throughput of a state-of-charge swing of `depth` (`0..=1`) applied twice,
    /// once per half-cycle.
    pub fn throughput(self, depth: f64) -> Self {
        self * (2.0 * depth)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn from_kilowatt_hours_ok() {
        assert_abs_diff_eq!(AmpereHours::from(KilowattHours(64.0)).0, 100.0);
    }

    #[test]
    fn throughput_ok() {
        assert_abs_diff_eq!(AmpereHours(100.0).throughput(0.5).0, 100.0);
    }
}
