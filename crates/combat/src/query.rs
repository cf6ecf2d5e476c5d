//! Ray casting capability consumed by the resolver.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque collider reference supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(pub u64);

/// Opaque rigid body reference supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// Bit set of collision layers a cast may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn contains(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// A well-formed cast: unit direction and positive, finite length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl Ray {
    /// Normalises `direction`. Returns `None` for a zero direction or a
    /// non-positive distance.
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Self> {
        let direction = direction.try_normalize()?;
        if !(max_distance > 0.0) || !origin.is_finite() {
            return None;
        }
        Some(Self {
            origin,
            direction,
            max_distance,
        })
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn end_point(&self) -> Vec3 {
        self.point_at(self.max_distance)
    }
}

/// One ray intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub collider: ColliderId,
    pub body: Option<BodyId>,
    pub is_trigger: bool,
}

/// Ray queries against the host's physics scene. Both queries include
/// trigger colliders.
pub trait SpatialQuery {
    /// Closest hit within `ray.max_distance` on a layer in `mask`.
    fn raycast_nearest(&self, ray: &Ray, mask: LayerMask) -> Option<Hit>;

    /// Append up to `max_hits` hits, in no particular order, to `out`.
    /// Returns how many were appended.
    fn raycast_all(&self, ray: &Ray, mask: LayerMask, max_hits: usize, out: &mut Vec<Hit>) -> usize;
}

/// The nearest hit and its point, or no hit and the end of the ray.
pub fn hit_or_max_point<Q: SpatialQuery + ?Sized>(
    query: &Q,
    ray: &Ray,
    mask: LayerMask,
) -> (Option<Hit>, Vec3) {
    match query.raycast_nearest(ray, mask) {
        Some(hit) => (Some(hit), hit.point),
        None => (None, ray.end_point()),
    }
}
