//! Time management for the simulation loop.

use std::time::Duration;

/// Source of the per-tick delta time (seconds).
pub trait Clock {
    /// Duration of the current tick in seconds.
    fn delta_seconds(&self) -> f32;
}

/// Manages frame timing for a tick-driven simulation.
///
/// Time only moves when the host calls [`Time::advance`], which keeps headless
/// runs deterministic.
#[derive(Debug, Clone)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Step used by fixed-rate hosts (default 60 Hz).
    fixed_timestep: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
        }
    }

    /// Advance by `seconds` at the start of a new frame. Negative, non-finite
    /// or unrepresentably large deltas count as zero.
    pub fn advance(&mut self, seconds: f32) {
        self.delta = Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO);
        self.elapsed = self.elapsed.saturating_add(self.delta);
        self.frame_count += 1;
    }

    /// Advance by one fixed step.
    pub fn advance_fixed(&mut self) {
        self.advance(self.fixed_timestep_seconds());
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Set the fixed timestep rate in Hz. Rates that do not give a usable
    /// step (non-positive, NaN, or so extreme the step overflows or rounds to
    /// zero) are ignored.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        match Duration::try_from_secs_f64(1.0 / hz) {
            Ok(step) if hz > 0.0 && !step.is_zero() => self.fixed_timestep = step,
            _ => log::warn!("Ignoring unusable fixed rate {}", hz),
        }
    }
}

impl Clock for Time {
    fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
