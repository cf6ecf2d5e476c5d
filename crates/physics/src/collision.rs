//! Collision layers and handle conversions.

use combat::{BodyId, ColliderId, LayerMask};
use rapier3d::prelude::*;

/// Collision layers for different object types. Each is one bit of a
/// [`LayerMask`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionLayer {
    /// Static environment (ground, walls)
    Environment = 1 << 0,
    /// Character bodies and damage regions
    Character = 1 << 1,
    /// Pushable props
    Debris = 1 << 2,
    /// Moving platforms
    Platform = 1 << 3,
    /// Triggers and sensors
    Trigger = 1 << 4,
    /// Targets that take damage but are not characters
    Target = 1 << 5,
}

impl CollisionLayer {
    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn mask(self) -> LayerMask {
        LayerMask(self.bits())
    }

    /// Groups for a collider on this layer. Every layer interacts with
    /// everything.
    pub fn groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_retain(self.bits()), Group::ALL)
    }
}

/// Query groups that accept colliders on any layer in `mask`.
pub fn query_groups(mask: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::ALL, Group::from_bits_retain(mask.0))
}

/// Mask of every layer weapons should consider.
pub fn weapon_mask() -> LayerMask {
    LayerMask(
        CollisionLayer::Environment.bits()
            | CollisionLayer::Character.bits()
            | CollisionLayer::Debris.bits()
            | CollisionLayer::Platform.bits()
            | CollisionLayer::Trigger.bits()
            | CollisionLayer::Target.bits(),
    )
}

pub fn collider_id(handle: ColliderHandle) -> ColliderId {
    let (index, generation) = handle.into_raw_parts();
    ColliderId(((generation as u64) << 32) | index as u64)
}

pub fn collider_handle(id: ColliderId) -> ColliderHandle {
    ColliderHandle::from_raw_parts(id.0 as u32, (id.0 >> 32) as u32)
}

pub fn body_id(handle: RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId(((generation as u64) << 32) | index as u64)
}

pub fn body_handle(id: BodyId) -> RigidBodyHandle {
    RigidBodyHandle::from_raw_parts(id.0 as u32, (id.0 >> 32) as u32)
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle) -> Self {
        Self {
            rigid_body,
            collider: None,
        }
    }

    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}
