//! Waypoint sequencer for moving platforms.
//!
//! A [`MotionProfile`] travels between consecutive waypoints (wrapping back
//! to the first after the last), easing along a [`MotionCurve`] and optionally
//! waiting at the first and last waypoint. It can be brought to rest with a
//! constant deceleration and later accelerated back onto its curve; the
//! hand-off inverts the curve to find where on it the platform now is.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::curve::MotionCurve;

/// Below this a distance or speed counts as zero.
const EPSILON: f32 = 1e-5;

/// Authored platform configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// World-space waypoints, visited in order and wrapping around.
    pub waypoints: Vec<Vec3>,
    /// Units per second, averaged over a segment. Zero parks the platform.
    pub average_speed: f32,
    /// Seconds to wait after arriving at the first waypoint.
    pub start_wait_time: f32,
    /// Seconds to wait after arriving at the last waypoint.
    pub end_wait_time: f32,
    pub curve: MotionCurve,
    /// Seconds to accelerate from rest to the average speed.
    pub smooth_start_duration: f32,
    /// Upper bound on the seconds spent decelerating to rest.
    pub smooth_stop_duration: f32,
    /// World axis the platform spins around while moving.
    pub spin_axis: Vec3,
    /// Degrees per second. Zero disables spinning.
    pub spin_speed: f32,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            waypoints: vec![Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0)],
            average_speed: 2.0,
            start_wait_time: 1.0,
            end_wait_time: 1.0,
            curve: MotionCurve::EaseInOut,
            smooth_start_duration: 1.0,
            smooth_stop_duration: 1.0,
            spin_axis: Vec3::Y,
            spin_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionPhase {
    Traveling,
    WaitingAtStart,
    WaitingAtEnd,
    SmoothStarting,
    SmoothStopping,
    /// At rest until started again.
    Stopped,
}

/// Notifications raised while the profile runs. Drain them with
/// [`MotionProfile::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Arrived { waypoint: usize },
    Departed { waypoint: usize },
}

/// Snapshot of the journey in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfileState {
    pub last_position: Vec3,
    pub next_position: Vec3,
    pub last_index: usize,
    pub next_index: usize,
    pub travel_distance: f32,
    /// `f32::INFINITY` when the platform never arrives.
    pub travel_duration: f32,
    pub elapsed: f32,
    pub phase: MotionPhase,
}

/// Constant-acceleration leg used by smooth start and smooth stop.
#[derive(Debug, Clone, Copy, Default)]
struct SmoothLeg {
    timer: f32,
    duration: f32,
    initial_speed: f32,
    acceleration: f32,
    origin: Vec3,
    direction: Vec3,
    planned_distance: f32,
}

impl SmoothLeg {
    fn distance_at(&self, t: f32) -> f32 {
        self.initial_speed * t + 0.5 * self.acceleration * t * t
    }
}

pub struct MotionProfile {
    settings: PlatformSettings,
    last_index: usize,
    next_index: usize,
    last_position: Vec3,
    next_position: Vec3,
    travel_distance: f32,
    travel_duration: f32,
    elapsed: f32,
    wait_timer: f32,
    phase: MotionPhase,
    position: Vec3,
    rotation: Quat,
    previous_position: Vec3,
    previous_dt: f32,
    leg: SmoothLeg,
    events: Vec<PlatformEvent>,
}

impl MotionProfile {
    /// Place the platform on the first waypoint and begin the first segment.
    pub fn new(settings: PlatformSettings) -> Self {
        let start = settings.waypoints.first().copied().unwrap_or(Vec3::ZERO);
        let count = settings.waypoints.len();
        let mut profile = Self {
            settings,
            last_index: count.saturating_sub(1),
            next_index: 0,
            last_position: start,
            next_position: start,
            travel_distance: 0.0,
            travel_duration: 0.0,
            elapsed: 0.0,
            wait_timer: 0.0,
            phase: MotionPhase::Stopped,
            position: start,
            rotation: Quat::IDENTITY,
            previous_position: start,
            previous_dt: 0.0,
            leg: SmoothLeg::default(),
            events: Vec::new(),
        };

        if count == 0 {
            log::warn!("Moving platform has no waypoints; it will stay stopped");
        } else {
            profile.go_to_next();
        }
        profile
    }

    pub fn settings(&self) -> &PlatformSettings {
        &self.settings
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn is_moving(&self) -> bool {
        matches!(
            self.phase,
            MotionPhase::Traveling | MotionPhase::SmoothStarting | MotionPhase::SmoothStopping
        )
    }

    pub fn state(&self) -> MotionProfileState {
        MotionProfileState {
            last_position: self.last_position,
            next_position: self.next_position,
            last_index: self.last_index,
            next_index: self.next_index,
            travel_distance: self.travel_distance,
            travel_duration: self.travel_duration,
            elapsed: self.elapsed,
            phase: self.phase,
        }
    }

    /// Speed over the most recent tick.
    pub fn current_speed(&self) -> f32 {
        if self.previous_dt > 0.0 {
            self.position.distance(self.previous_position) / self.previous_dt
        } else {
            0.0
        }
    }

    pub fn take_events(&mut self) -> Vec<PlatformEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin the next segment: the current target becomes the origin.
    pub fn go_to_next(&mut self) {
        let count = self.settings.waypoints.len();
        if count == 0 {
            return;
        }

        self.last_index = self.next_index % count;
        self.next_index = (self.last_index + 1) % count;
        self.last_position = self.settings.waypoints[self.last_index];
        self.next_position = self.settings.waypoints[self.next_index];
        self.travel_distance = self.last_position.distance(self.next_position);
        self.travel_duration = if self.settings.average_speed > 0.0 {
            self.travel_distance / self.settings.average_speed
        } else {
            f32::INFINITY
        };
        self.elapsed = 0.0;
        self.wait_timer = 0.0;
        self.position = self.last_position;

        let at_start = self.last_index == 0;
        let at_end = self.last_index == count - 1;
        let wait = self.wait_time_at(self.last_index);

        self.events.push(PlatformEvent::Arrived {
            waypoint: self.last_index,
        });

        if wait > 0.0 && at_start {
            self.set_phase(MotionPhase::WaitingAtStart);
        } else if wait > 0.0 && at_end {
            self.set_phase(MotionPhase::WaitingAtEnd);
        } else {
            self.events.push(PlatformEvent::Departed {
                waypoint: self.last_index,
            });
            self.set_phase(MotionPhase::Traveling);
        }
    }

    /// Reverse travel by swapping origin and destination.
    pub fn change_direction(&mut self) {
        std::mem::swap(&mut self.last_index, &mut self.next_index);
        std::mem::swap(&mut self.last_position, &mut self.next_position);
    }

    /// Advance by `dt` seconds and return the new position.
    pub fn tick(&mut self, dt: f32) -> Vec3 {
        if !(dt > 0.0) {
            return self.position;
        }

        let before = self.position;

        match self.phase {
            MotionPhase::Stopped => {}
            MotionPhase::WaitingAtStart | MotionPhase::WaitingAtEnd => {
                self.wait_timer += dt;
                if self.wait_timer >= self.wait_time_at(self.last_index) {
                    self.set_phase(MotionPhase::Traveling);
                    self.events.push(PlatformEvent::Departed {
                        waypoint: self.last_index,
                    });
                }
            }
            MotionPhase::Traveling => self.tick_traveling(dt),
            MotionPhase::SmoothStarting => self.tick_smooth_start(dt),
            MotionPhase::SmoothStopping => self.tick_smooth_stop(dt),
        }

        if self.is_moving() && self.settings.spin_speed != 0.0 {
            let mut transform = engine_core::Transform::from_position_rotation(self.position, self.rotation);
            transform.rotate_about(self.settings.spin_axis, self.settings.spin_speed.to_radians() * dt);
            self.rotation = transform.rotation;
        }

        self.previous_position = before;
        self.previous_dt = dt;
        self.position
    }

    /// Halt immediately.
    pub fn stop(&mut self) {
        self.set_phase(MotionPhase::Stopped);
    }

    /// Resume at full curve speed from wherever the platform rests.
    pub fn start(&mut self) {
        if self.phase != MotionPhase::Stopped || self.settings.waypoints.is_empty() {
            return;
        }
        let progress = self.segment_progress();
        self.elapsed = if self.travel_duration.is_finite() {
            self.settings.curve.time_for_progress(progress) * self.travel_duration
        } else {
            0.0
        };
        self.set_phase(MotionPhase::Traveling);
    }

    /// Decelerate at a constant rate to rest before the next waypoint.
    pub fn smooth_stop(&mut self) {
        match self.phase {
            MotionPhase::Stopped | MotionPhase::SmoothStopping => return,
            MotionPhase::WaitingAtStart | MotionPhase::WaitingAtEnd => {
                self.set_phase(MotionPhase::Stopped);
                return;
            }
            MotionPhase::Traveling | MotionPhase::SmoothStarting => {}
        }

        let speed = self.current_speed();
        let remaining_distance = self.position.distance(self.next_position);
        let remaining_time = match self.phase {
            MotionPhase::Traveling => (self.travel_duration - self.elapsed).max(0.0),
            _ if speed > EPSILON => remaining_distance / speed,
            _ => 0.0,
        };
        let stop_time = self.settings.smooth_stop_duration.min(remaining_time);
        let direction = (self.next_position - self.position).normalize_or_zero();

        if speed <= EPSILON || !(stop_time > 0.0) || direction == Vec3::ZERO {
            self.set_phase(MotionPhase::Stopped);
            return;
        }

        let acceleration = -speed / stop_time;
        self.leg = SmoothLeg {
            timer: 0.0,
            duration: stop_time,
            initial_speed: speed,
            acceleration,
            origin: self.position,
            direction,
            planned_distance: 0.0,
        };
        self.leg.planned_distance = self.leg.distance_at(stop_time);
        self.set_phase(MotionPhase::SmoothStopping);
    }

    /// Accelerate from rest until the curve's own speed takes over.
    pub fn smooth_start(&mut self) {
        if self.phase != MotionPhase::Stopped || self.settings.waypoints.is_empty() {
            return;
        }

        let direction = (self.next_position - self.position).normalize_or_zero();
        if self.settings.smooth_start_duration <= 0.0
            || self.settings.average_speed <= 0.0
            || direction == Vec3::ZERO
        {
            self.start();
            return;
        }

        self.leg = SmoothLeg {
            timer: 0.0,
            duration: self.settings.smooth_start_duration,
            initial_speed: 0.0,
            acceleration: self.settings.average_speed / self.settings.smooth_start_duration,
            origin: self.position,
            direction,
            planned_distance: self.position.distance(self.next_position),
        };
        self.set_phase(MotionPhase::SmoothStarting);
    }

    /// Return to the first waypoint as if newly created.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }

    fn set_phase(&mut self, phase: MotionPhase) {
        if self.phase != phase {
            log::debug!(
                "Platform {:?} -> {:?} (waypoint {} -> {})",
                self.phase,
                phase,
                self.last_index,
                self.next_index
            );
            self.phase = phase;
        }
    }

    fn tick_traveling(&mut self, dt: f32) {
        self.elapsed += dt;
        let t = if self.travel_duration > 0.0 {
            (self.elapsed / self.travel_duration).min(1.0)
        } else {
            1.0
        };
        let progress = self.settings.curve.evaluate(t);
        self.position = self.last_position.lerp(self.next_position, progress);

        if self.elapsed >= self.travel_duration {
            self.go_to_next();
        }
    }

    fn tick_smooth_stop(&mut self, dt: f32) {
        self.leg.timer += dt;
        let mut distance = self.leg.distance_at(self.leg.timer);
        let finished = self.leg.timer > self.leg.duration || distance >= self.leg.planned_distance;
        if finished {
            distance = self.leg.planned_distance;
        }
        self.position = self.leg.origin + self.leg.direction * distance;
        if finished {
            self.set_phase(MotionPhase::Stopped);
        }
    }

    fn tick_smooth_start(&mut self, dt: f32) {
        self.leg.timer += dt;
        let speed = self.leg.acceleration * self.leg.timer;
        let distance = self.leg.distance_at(self.leg.timer);

        if distance >= self.leg.planned_distance {
            self.position = self.next_position;
            self.go_to_next();
            return;
        }
        self.position = self.leg.origin + self.leg.direction * distance;

        let curve = &self.settings.curve;
        let curve_time = curve.time_for_progress(self.segment_progress());
        let curve_speed = if self.travel_duration.is_finite() && self.travel_duration > 0.0 {
            curve.slope_at(curve_time) * self.travel_distance / self.travel_duration
        } else {
            0.0
        };

        if speed >= curve_speed {
            self.elapsed = if self.travel_duration.is_finite() {
                curve_time * self.travel_duration
            } else {
                0.0
            };
            self.set_phase(MotionPhase::Traveling);
        }
    }

    /// Fraction of the current segment already covered; 0 for a zero-length segment.
    fn segment_progress(&self) -> f32 {
        if self.travel_distance <= EPSILON {
            return 0.0;
        }
        (self.position.distance(self.last_position) / self.travel_distance).clamp(0.0, 1.0)
    }

    fn wait_time_at(&self, index: usize) -> f32 {
        let count = self.settings.waypoints.len();
        if index == 0 {
            self.settings.start_wait_time
        } else if count > 0 && index == count - 1 {
            self.settings.end_wait_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(speed: f32, start_wait: f32, end_wait: f32) -> PlatformSettings {
        PlatformSettings {
            waypoints: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
            average_speed: speed,
            start_wait_time: start_wait,
            end_wait_time: end_wait,
            curve: MotionCurve::Linear,
            smooth_start_duration: 1.0,
            smooth_stop_duration: 1.0,
            spin_axis: Vec3::Y,
            spin_speed: 0.0,
        }
    }

    #[test]
    fn starts_traveling_from_first_waypoint() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 0.0));
        assert_eq!(p.position(), Vec3::ZERO);
        assert_eq!(p.phase(), MotionPhase::Traveling);
        assert_eq!(
            p.take_events(),
            vec![
                PlatformEvent::Arrived { waypoint: 0 },
                PlatformEvent::Departed { waypoint: 0 }
            ]
        );
        let s = p.state();
        assert_eq!((s.last_index, s.next_index), (0, 1));
        assert!((s.travel_duration - 5.0).abs() < 1e-6);
    }

    #[test]
    fn two_waypoint_round_trip_reverses() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 0.0));
        p.take_events();
        for _ in 0..4 {
            p.tick(1.0);
        }
        assert!((p.position().x - 8.0).abs() < 1e-4);
        p.tick(1.0);
        assert!((p.position() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
        let s = p.state();
        assert_eq!((s.last_index, s.next_index), (1, 0));
        assert_eq!(s.phase, MotionPhase::Traveling);
        assert_eq!(
            p.take_events(),
            vec![
                PlatformEvent::Arrived { waypoint: 1 },
                PlatformEvent::Departed { waypoint: 1 }
            ]
        );
        p.tick(1.0);
        assert!((p.position().x - 8.0).abs() < 1e-4);
    }

    #[test]
    fn waits_at_end_then_departs() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 2.0));
        p.take_events();
        for _ in 0..5 {
            p.tick(1.0);
        }
        assert_eq!(p.phase(), MotionPhase::WaitingAtEnd);
        assert_eq!(p.take_events(), vec![PlatformEvent::Arrived { waypoint: 1 }]);
        p.tick(1.0);
        assert_eq!(p.phase(), MotionPhase::WaitingAtEnd);
        p.tick(1.0);
        assert_eq!(p.phase(), MotionPhase::Traveling);
        assert_eq!(p.take_events(), vec![PlatformEvent::Departed { waypoint: 1 }]);
        assert!((p.position().x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn waits_at_start_on_creation() {
        let mut p = MotionProfile::new(straight(2.0, 1.5, 0.0));
        assert_eq!(p.phase(), MotionPhase::WaitingAtStart);
        assert_eq!(p.take_events(), vec![PlatformEvent::Arrived { waypoint: 0 }]);
        p.tick(1.0);
        p.tick(1.0);
        assert_eq!(p.phase(), MotionPhase::Traveling);
        assert_eq!(p.position(), Vec3::ZERO);
    }

    #[test]
    fn zero_speed_parks_forever() {
        let mut p = MotionProfile::new(straight(0.0, 0.0, 0.0));
        assert!(p.state().travel_duration.is_infinite());
        for _ in 0..100 {
            p.tick(1.0);
        }
        assert_eq!(p.position(), Vec3::ZERO);
        assert_eq!(p.state().last_index, 0);
    }

    #[test]
    fn zero_length_segment_advances_immediately() {
        let mut p = MotionProfile::new(PlatformSettings {
            waypoints: vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
            start_wait_time: 0.0,
            end_wait_time: 0.0,
            curve: MotionCurve::Linear,
            average_speed: 1.0,
            ..Default::default()
        });
        p.tick(0.1);
        let s = p.state();
        assert_eq!((s.last_index, s.next_index), (1, 2));
        assert!(!p.position().is_nan());
    }

    #[test]
    fn cycles_through_all_waypoints() {
        let mut p = MotionProfile::new(PlatformSettings {
            waypoints: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            start_wait_time: 0.0,
            end_wait_time: 0.0,
            curve: MotionCurve::Linear,
            average_speed: 1.0,
            ..Default::default()
        });
        p.take_events();
        let mut arrivals = Vec::new();
        for _ in 0..40 {
            p.tick(0.1);
            for e in p.take_events() {
                if let PlatformEvent::Arrived { waypoint } = e {
                    arrivals.push(waypoint);
                }
            }
        }
        assert!(arrivals.starts_with(&[1, 2, 0]));
    }

    #[test]
    fn change_direction_swaps_endpoints() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 0.0));
        let before = p.state();
        p.change_direction();
        let after = p.state();
        assert_eq!(after.last_index, before.next_index);
        assert_eq!(after.next_index, before.last_index);
        assert_eq!(after.last_position, before.next_position);
        assert_eq!(after.next_position, before.last_position);
        assert_eq!(after.elapsed, before.elapsed);
    }

    #[test]
    fn smooth_stop_decelerates_to_rest() {
        let mut settings = straight(10.0, 0.0, 0.0);
        settings.waypoints[1] = Vec3::new(100.0, 0.0, 0.0);
        let mut p = MotionProfile::new(settings);
        p.tick(0.1);
        p.tick(0.1);
        assert!((p.current_speed() - 10.0).abs() < 1e-2);

        p.smooth_stop();
        assert_eq!(p.phase(), MotionPhase::SmoothStopping);
        let mut last_x = p.position().x;
        let mut last_speed = f32::MAX;
        for _ in 0..20 {
            p.tick(0.1);
            let x = p.position().x;
            assert!(x >= last_x);
            let speed = p.current_speed();
            assert!(speed <= last_speed + 1e-3);
            last_speed = speed;
            last_x = x;
        }
        assert_eq!(p.phase(), MotionPhase::Stopped);
        // v0 = 10 over 1 s stops 5 units beyond x = 2.
        assert!((p.position().x - 7.0).abs() < 1e-2);
    }

    #[test]
    fn smooth_stop_bounded_by_remaining_travel() {
        let mut p = MotionProfile::new(straight(10.0, 0.0, 0.0));
        for _ in 0..9 {
            p.tick(0.1);
        }
        p.smooth_stop();
        for _ in 0..20 {
            p.tick(0.1);
        }
        assert_eq!(p.phase(), MotionPhase::Stopped);
        assert!(p.position().x <= 10.0 + 1e-3);
    }

    #[test]
    fn smooth_start_hands_off_to_curve() {
        let mut settings = straight(10.0, 0.0, 0.0);
        settings.waypoints[1] = Vec3::new(100.0, 0.0, 0.0);
        let mut p = MotionProfile::new(settings);
        p.stop();
        p.smooth_start();
        assert_eq!(p.phase(), MotionPhase::SmoothStarting);
        p.tick(0.1);
        assert!(p.position().x > 0.0 && p.position().x < 0.1);
        for _ in 0..14 {
            p.tick(0.1);
        }
        assert_eq!(p.phase(), MotionPhase::Traveling);
        // Elapsed was resynchronised to the platform's place on the curve.
        let s = p.state();
        let expected = p.position().x / 100.0 * s.travel_duration;
        assert!((s.elapsed - expected).abs() < 0.2);
    }

    #[test]
    fn start_resumes_from_rest_position() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 0.0));
        p.tick(1.0);
        p.tick(1.0);
        p.stop();
        p.tick(1.0);
        assert!((p.position().x - 4.0).abs() < 1e-4);
        p.start();
        p.tick(1.0);
        assert!((p.position().x - 6.0).abs() < 0.1);
    }

    #[test]
    fn spins_only_while_moving() {
        let mut settings = straight(2.0, 0.0, 5.0);
        settings.spin_speed = 90.0;
        let mut p = MotionProfile::new(settings);
        p.tick(1.0);
        assert!(p.rotation().angle_between(Quat::IDENTITY) > 1.0);
        for _ in 0..4 {
            p.tick(1.0);
        }
        let parked = p.rotation();
        p.tick(1.0);
        assert_eq!(p.rotation(), parked);
    }

    #[test]
    fn reset_returns_to_first_waypoint() {
        let mut p = MotionProfile::new(straight(2.0, 0.0, 0.0));
        p.tick(1.0);
        p.reset();
        assert_eq!(p.position(), Vec3::ZERO);
        assert_eq!(p.state().elapsed, 0.0);
    }

    #[test]
    fn empty_waypoints_stay_stopped() {
        let mut p = MotionProfile::new(PlatformSettings {
            waypoints: Vec::new(),
            ..Default::default()
        });
        assert_eq!(p.phase(), MotionPhase::Stopped);
        p.smooth_start();
        p.tick(1.0);
        assert_eq!(p.position(), Vec3::ZERO);
    }
}
