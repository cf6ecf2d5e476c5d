//! Proportional-integral-derivative controller.

use serde::{Deserialize, Serialize};

/// Inclusive bounds for a single controller term or the final input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermLimits {
    pub min: f32,
    pub max: f32,
}

impl TermLimits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp without panicking on swapped bounds.
    pub fn clamp(&self, value: f32) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        value.max(lo).min(hi)
    }
}

impl Default for TermLimits {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

/// Tuning for a [`PidController`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidSettings {
    pub p_gain: f32,
    pub i_gain: f32,
    pub d_gain: f32,
    /// Bounds for the summed output and for the accumulated integral.
    pub input_limits: TermLimits,
    /// Clamp each term separately before summing.
    pub use_individual_limits: bool,
    pub p_limits: TermLimits,
    pub i_limits: TermLimits,
    pub d_limits: TermLimits,
    /// Differentiate the measured value instead of the error, so a jump in the
    /// target does not spike the derivative term.
    pub derivative_on_measurement: bool,
}

impl Default for PidSettings {
    fn default() -> Self {
        Self {
            p_gain: 1.0,
            i_gain: 0.0,
            d_gain: 0.0,
            input_limits: TermLimits::default(),
            use_individual_limits: false,
            p_limits: TermLimits::default(),
            i_limits: TermLimits::default(),
            d_limits: TermLimits::default(),
            derivative_on_measurement: true,
        }
    }
}

/// The three gain-weighted contributions of the most recent update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidTerms {
    pub proportional: f32,
    pub integral: f32,
    pub derivative: f32,
}

/// Stateful PID loop producing a bounded control input.
#[derive(Debug, Clone)]
pub struct PidController {
    settings: PidSettings,
    /// Integral accumulated with the gain already applied, so changing
    /// `i_gain` only affects future error.
    integral_times_gain: f32,
    previous_error: f32,
    previous_actual: f32,
    first_update: bool,
    last_input: f32,
    last_terms: PidTerms,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new(PidSettings::default())
    }
}

impl PidController {
    pub fn new(settings: PidSettings) -> Self {
        Self {
            settings,
            integral_times_gain: 0.0,
            previous_error: 0.0,
            previous_actual: 0.0,
            first_update: true,
            last_input: 0.0,
            last_terms: PidTerms::default(),
        }
    }

    pub fn settings(&self) -> &PidSettings {
        &self.settings
    }

    /// Change the gains. Integral history is kept as-is.
    pub fn set_gains(&mut self, p_gain: f32, i_gain: f32, d_gain: f32) {
        self.settings.p_gain = p_gain;
        self.settings.i_gain = i_gain;
        self.settings.d_gain = d_gain;
    }

    /// Compute the control input that drives `actual` towards `target`.
    ///
    /// A non-positive (or NaN) `dt` leaves the controller untouched and returns
    /// the previous input.
    pub fn compute_input(&mut self, target: f32, actual: f32, dt: f32) -> f32 {
        if !(dt > 0.0) {
            return self.last_input;
        }

        let target = if target.is_nan() { 0.0 } else { target };
        let s = &self.settings;

        let proportional = target - actual;

        self.integral_times_gain = s
            .input_limits
            .clamp(self.integral_times_gain + proportional * dt * s.i_gain);

        let derivative = if self.first_update {
            self.first_update = false;
            0.0
        } else if s.derivative_on_measurement {
            (self.previous_actual - actual) / dt
        } else {
            (proportional - self.previous_error) / dt
        };

        self.previous_error = proportional;
        self.previous_actual = actual;

        let mut terms = PidTerms {
            proportional: proportional * s.p_gain,
            integral: self.integral_times_gain,
            derivative: derivative * s.d_gain,
        };

        if s.use_individual_limits {
            terms.proportional = s.p_limits.clamp(terms.proportional);
            terms.integral = s.i_limits.clamp(terms.integral);
            terms.derivative = s.d_limits.clamp(terms.derivative);
        }

        let input = s
            .input_limits
            .clamp(terms.proportional + terms.integral + terms.derivative);

        self.last_terms = terms;
        self.last_input = input;
        input
    }

    /// Terms from the most recent successful update.
    pub fn last_terms(&self) -> PidTerms {
        self.last_terms
    }

    pub fn last_input(&self) -> f32 {
        self.last_input
    }

    /// Forget accumulated state. Gains and limits are kept.
    pub fn reset(&mut self) {
        self.integral_times_gain = 0.0;
        self.previous_error = 0.0;
        self.previous_actual = 0.0;
        self.first_update = true;
        self.last_input = 0.0;
        self.last_terms = PidTerms::default();
    }
}
