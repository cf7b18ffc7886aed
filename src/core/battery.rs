use crate::{
    core::fleet::VehicleType,
    quantity::{Zero, charge::AmpereHours},
};

/// Share of the full capacity whose loss counts as the complete fade of the battery.
pub const FADE_REFERENCE_SHARE: f64 = 0.2;

/// Battery state of a single vehicle over one simulation run.
#[must_use]
#[derive(Clone, Debug)]
pub struct BatteryState {
    /// Full capacity (usable plus reserve), the normalization reference.
    full_capacity: AmpereHours,

    /// Remaining usable capacity.
    capacity: AmpereHours,

    /// Total lost capacity.
    cumulative_fade: AmpereHours,

    /// Total lost capacity relative to [`FADE_REFERENCE_SHARE`] of the full capacity.
    ///
    /// Keeps growing past `1.0`, unlike the state of health.
    cumulative_fade_ratio: f64,

    /// `1 - cumulative_fade_ratio`, floored at zero.
    state_of_health: f64,

    /// Age in whole simulated years.
    age: u32,

    /// State of health at the start of every year, including year zero.
    yearly_state_of_health: Vec<f64>,

    /// Fade ratio at the start of every year, including year zero.
    yearly_fade_ratio: Vec<f64>,

    needs_replacement: bool,
}

impl BatteryState {
    pub fn new(vehicle_type: &VehicleType) -> Self {
        Self {
            full_capacity: vehicle_type.nominal_charge(),
            capacity: vehicle_type.usable_charge(),
            cumulative_fade: AmpereHours::ZERO,
            cumulative_fade_ratio: 0.0,
            state_of_health: 1.0,
            age: 0,
            yearly_state_of_health: vec![1.0],
            yearly_fade_ratio: vec![0.0],
            needs_replacement: false,
        }
    }

    pub const fn capacity(&self) -> AmpereHours {
        self.capacity
    }

    pub const fn cumulative_fade(&self) -> AmpereHours {
        self.cumulative_fade
    }

    #[must_use]
    pub const fn cumulative_fade_ratio(&self) -> f64 {
        self.cumulative_fade_ratio
    }

    #[must_use]
    pub const fn state_of_health(&self) -> f64 {
        self.state_of_health
    }

    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub fn yearly_state_of_health(&self) -> &[f64] {
        &self.yearly_state_of_health
    }

    #[must_use]
    pub fn yearly_fade_ratio(&self) -> &[f64] {
        &self.yearly_fade_ratio
    }

    #[must_use]
    pub const fn needs_replacement(&self) -> bool {
        self.needs_replacement
    }

    /// Apply the incremental capacity loss of a single event.
    ///
    /// Negative increments are applied as zero, the battery never recovers capacity.
    /// Returns whether the increment had to be clamped.
    pub fn apply_fade(&mut self, fade: AmpereHours) -> bool {
        let is_negative = fade < AmpereHours::ZERO;
        let fade = fade.max(AmpereHours::ZERO);

        self.cumulative_fade += fade;
        self.cumulative_fade_ratio += fade / (self.full_capacity * FADE_REFERENCE_SHARE);
        self.capacity = (self.capacity - fade).max(AmpereHours::ZERO);
        self.state_of_health = 1.0 - self.cumulative_fade_ratio;

        if self.state_of_health <= 0.0 {
            self.state_of_health = 0.0;
            self.needs_replacement = true;
        }

        is_negative
    }

    /// Snapshot the current state into the yearly history and grow one year older.
    pub fn advance_year(&mut self) {
        self.yearly_state_of_health.push(self.state_of_health);
        self.yearly_fade_ratio.push(self.cumulative_fade_ratio);
        self.age += 1;
    }
}
