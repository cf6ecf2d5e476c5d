//! Easing curves mapping normalised time to normalised progress.

use serde::{Deserialize, Serialize};

/// Iteration cap for [`MotionCurve::time_for_progress`].
pub const MAX_SEARCH_ITERATIONS: usize = 10;
/// Acceptable progress error for [`MotionCurve::time_for_progress`].
pub const SEARCH_ERROR_MARGIN: f32 = 0.01;
/// Half-width of the centred difference used by [`MotionCurve::slope_at`].
pub const SLOPE_HALF_WIDTH: f32 = 0.005;

/// A single authored point on a keyframed curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Motion profile between two waypoints.
///
/// Curves are expected to rise from 0 at time 0 to 1 at time 1 without
/// decreasing in between; the inverse lookup relies on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum MotionCurve {
    #[default]
    Linear,
    /// Quadratic ease-in.
    EaseIn,
    /// Quadratic ease-out.
    EaseOut,
    /// Smoothstep.
    EaseInOut,
    /// Piecewise-linear through keys sorted by time.
    Keyframes(Vec<CurveKey>),
}

impl MotionCurve {
    /// Progress at normalised time `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            MotionCurve::Linear => t,
            MotionCurve::EaseIn => t * t,
            MotionCurve::EaseOut => t * (2.0 - t),
            MotionCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            MotionCurve::Keyframes(keys) => evaluate_keys(keys, t),
        }
    }

    /// Approximate the time at which the curve reaches `progress` by bounded
    /// binary search.
    pub fn time_for_progress(&self, progress: f32) -> f32 {
        let target = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        let mut mid = 0.5;

        for _ in 0..MAX_SEARCH_ITERATIONS {
            mid = 0.5 * (lo + hi);
            let value = self.evaluate(mid);
            if (value - target).abs() <= SEARCH_ERROR_MARGIN {
                break;
            }
            if value < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        mid
    }

    /// Rate of change of progress per unit of normalised time around `t`,
    /// by centred difference clamped at the domain edges.
    pub fn slope_at(&self, t: f32) -> f32 {
        let lo = (t - SLOPE_HALF_WIDTH).max(0.0);
        let hi = (t + SLOPE_HALF_WIDTH).min(1.0);
        if hi <= lo {
            return 0.0;
        }
        (self.evaluate(hi) - self.evaluate(lo)) / (hi - lo)
    }
}

fn evaluate_keys(keys: &[CurveKey], t: f32) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return t,
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.time {
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return b.value;
            }
            return a.value + (b.value - a.value) * (t - a.time) / span;
        }
    }
    last.value
}
