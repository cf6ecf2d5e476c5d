//! Moving platform driven by a motion profile, plus a rail cart that chases
//! it under PID control.

use engine_core::Transform;
use motion::{MotionProfile, PidController, PidSettings, PlatformEvent, PlatformSettings, RampSettings, RampSmoother};
use rapier3d::prelude::RigidBodyHandle;

use crate::scene::Scene;

/// A cart on a rail along X. The controller output is a throttle in
/// `[-1, 1]` that the ramp smooths before it becomes acceleration.
#[derive(Debug, Clone)]
pub struct Follower {
    pub position: f32,
    pub velocity: f32,
    max_acceleration: f32,
    drag: f32,
    pid: PidController,
    ramp: RampSmoother,
}

impl Follower {
    pub fn new(pid: PidSettings, ramp: RampSettings) -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            max_acceleration: 4.0,
            drag: 0.5,
            pid: PidController::new(pid),
            ramp: RampSmoother::new(ramp),
        }
    }

    /// Chase `target` for one step. Returns the smoothed throttle.
    pub fn update(&mut self, target: f32, dt: f32) -> f32 {
        if !(dt > 0.0) {
            return self.ramp.value();
        }
        let throttle = self.pid.compute_input(target, self.position, dt);
        let smoothed = self.ramp.smooth(throttle, dt);
        self.velocity += (smoothed * self.max_acceleration - self.drag * self.velocity) * dt;
        self.position += self.velocity * dt;
        smoothed
    }
}

pub struct PlatformDriver {
    profile: MotionProfile,
    body: RigidBodyHandle,
    pub follower: Follower,
    arrivals: u32,
}

impl PlatformDriver {
    pub fn new(
        scene: &mut Scene,
        settings: PlatformSettings,
        pid: PidSettings,
        ramp: RampSettings,
    ) -> Self {
        let profile = MotionProfile::new(settings);
        let body = scene.spawn_platform(profile.position(), glam::Vec3::new(1.5, 0.25, 1.5));
        Self {
            profile,
            body,
            follower: Follower::new(pid, ramp),
            arrivals: 0,
        }
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut MotionProfile {
        &mut self.profile
    }

    pub fn arrivals(&self) -> u32 {
        self.arrivals
    }

    /// Advance the profile, move the kinematic body and let the cart chase
    /// it. Returns this step's platform events.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) -> Vec<PlatformEvent> {
        let position = self.profile.tick(dt);
        let placement = Transform::from_position_rotation(position, self.profile.rotation());
        scene.physics.set_body_transform(self.body, &placement);

        let events = self.profile.take_events();
        for event in &events {
            match event {
                PlatformEvent::Arrived { waypoint } => {
                    self.arrivals += 1;
                    log::info!("Platform arrived at waypoint {}", waypoint);
                }
                PlatformEvent::Departed { waypoint } => {
                    log::info!("Platform departed waypoint {}", waypoint);
                }
            }
        }

        self.follower.update(position.x, dt);
        events
    }
}
