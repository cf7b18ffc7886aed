quantity!(Kelvin, via: f64, suffix: "K", precision: 2);

impl Kelvin {
    /// Ambient temperature used by the fleet simulation unless overridden.
    pub const DEFAULT_AMBIENT: Self = Self(300.15);

    pub const fn reciprocal(self) -> f64 {
        1.0 / self.0
    }
}
