//! Asymmetric exponential smoothing of a signed input in `[-1, 1]`.

use serde::{Deserialize, Serialize};

/// Exponential progress above this snaps to 1.
const SNAP_THRESHOLD: f32 = 0.999;

/// Ramp durations for a full 0 to 1 swing. Partial swings scale with their size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampSettings {
    pub ramp_up_duration: f32,
    pub ramp_down_duration: f32,
}

impl Default for RampSettings {
    fn default() -> Self {
        Self {
            ramp_up_duration: 0.5,
            ramp_down_duration: 0.25,
        }
    }
}

/// Smooths a signed input, ramping its magnitude up and down at different rates.
///
/// The sign is tracked apart from the magnitude. Reversing direction first
/// ramps the magnitude down to zero in the old direction, then ramps up in the
/// new one.
#[derive(Debug, Clone)]
pub struct RampSmoother {
    settings: RampSettings,
    sign: f32,
    magnitude: f32,
    start_magnitude: f32,
    target_magnitude: f32,
    timer: f32,
    duration: f32,
    previous_input: f32,
}

impl Default for RampSmoother {
    fn default() -> Self {
        Self::new(RampSettings::default())
    }
}

impl RampSmoother {
    pub fn new(settings: RampSettings) -> Self {
        Self {
            settings,
            sign: 1.0,
            magnitude: 0.0,
            start_magnitude: 0.0,
            target_magnitude: 0.0,
            timer: 0.0,
            duration: 0.0,
            previous_input: 0.0,
        }
    }

    pub fn settings(&self) -> &RampSettings {
        &self.settings
    }

    /// Feed this tick's raw input and get the smoothed value back.
    pub fn smooth(&mut self, current_input: f32, dt: f32) -> f32 {
        let input = if current_input.is_nan() {
            0.0
        } else {
            current_input.clamp(-1.0, 1.0)
        };
        self.previous_input = input;

        // Zero keeps whatever direction is in flight.
        let input_sign = if input > 0.0 {
            1.0
        } else if input < 0.0 {
            -1.0
        } else {
            self.sign
        };

        let target = if input_sign != self.sign && self.magnitude > 0.0 {
            0.0
        } else {
            self.sign = input_sign;
            input.abs()
        };

        if target != self.target_magnitude {
            let delta = target - self.magnitude;
            let full_swing = if delta > 0.0 {
                self.settings.ramp_up_duration
            } else {
                self.settings.ramp_down_duration
            };
            self.start_magnitude = self.magnitude;
            self.target_magnitude = target;
            self.duration = full_swing.max(0.0) * delta.abs();
            self.timer = 0.0;
        }

        if dt > 0.0 {
            self.timer += dt;
        }

        self.magnitude = if self.duration <= 0.0 {
            self.target_magnitude
        } else {
            let mut progress = (self.timer / self.duration).exp() - 1.0;
            if progress > SNAP_THRESHOLD {
                progress = 1.0;
            }
            self.start_magnitude + (self.target_magnitude - self.start_magnitude) * progress
        };

        self.sign * self.magnitude
    }

    /// Current smoothed output without advancing time.
    pub fn value(&self) -> f32 {
        self.sign * self.magnitude
    }

    pub fn previous_input(&self) -> f32 {
        self.previous_input
    }

    /// Zero all timers and remembered input.
    pub fn reset(&mut self) {
        self.sign = 1.0;
        self.magnitude = 0.0;
        self.start_magnitude = 0.0;
        self.target_magnitude = 0.0;
        self.timer = 0.0;
        self.duration = 0.0;
        self.previous_input = 0.0;
    }
}
