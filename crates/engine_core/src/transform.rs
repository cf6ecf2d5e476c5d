//! Transform type used to place pooled instances in the world.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Transform whose forward axis points along `normal`, spun by `spin` radians
    /// around that normal. Used to lay decals flat against a surface.
    pub fn facing(position: Vec3, normal: Vec3, spin: f32) -> Self {
        let normal = normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            return Self::from_position(position);
        }
        let align = Quat::from_rotation_arc(-Vec3::Z, normal);
        let rotation = Quat::from_axis_angle(normal, spin) * align;
        Self::from_position_rotation(position, rotation)
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Rotate around a world-space axis. A zero axis leaves the rotation unchanged.
    pub fn rotate_about(&mut self, axis: Vec3, angle: f32) {
        let axis = axis.normalize_or_zero();
        if axis != Vec3::ZERO {
            self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
        }
    }
}
