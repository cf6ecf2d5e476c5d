//! Ray queries for weapon hit detection.

use combat::{Hit, LayerMask, SpatialQuery};
use engine_core::Vec3;
use rapier3d::prelude::*;

use crate::collision::{body_id, collider_id, query_groups};
use crate::PhysicsWorld;

impl PhysicsWorld {
    fn to_hit(&self, ray: &Ray, collider: ColliderHandle, intersection: RayIntersection) -> Hit {
        let point = ray.point_at(intersection.time_of_impact);
        let co = self.collider_set.get(collider);
        Hit {
            point: Vec3::new(point.x, point.y, point.z),
            normal: Vec3::new(intersection.normal.x, intersection.normal.y, intersection.normal.z),
            distance: intersection.time_of_impact,
            collider: collider_id(collider),
            body: co.and_then(|c| c.parent()).map(body_id),
            is_trigger: co.is_some_and(|c| c.is_sensor()),
        }
    }

    /// Check if there's a clear line of sight between two points on the
    /// given layers. Triggers never block.
    pub fn line_of_sight(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        let direction = to - from;
        let distance = direction.length();
        if distance < 0.001 {
            return true;
        }

        let ray = Ray::new(point![from.x, from.y, from.z], vector![direction.x, direction.y, direction.z] / distance);
        let filter = QueryFilter::default().exclude_sensors().groups(query_groups(mask));
        self.query_pipeline
            .cast_ray(&self.rigid_body_set, &self.collider_set, &ray, distance, true, filter)
            .is_none()
    }
}

fn rapier_ray(ray: &combat::Ray) -> Ray {
    Ray::new(
        point![ray.origin.x, ray.origin.y, ray.origin.z],
        vector![ray.direction.x, ray.direction.y, ray.direction.z],
    )
}

impl SpatialQuery for PhysicsWorld {
    fn raycast_nearest(&self, ray: &combat::Ray, mask: LayerMask) -> Option<Hit> {
        let rapier = rapier_ray(ray);
        let filter = QueryFilter::default().groups(query_groups(mask));

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &rapier,
                ray.max_distance,
                true,
                filter,
            )
            .map(|(collider, intersection)| self.to_hit(&rapier, collider, intersection))
    }

    fn raycast_all(&self, ray: &combat::Ray, mask: LayerMask, max_hits: usize, out: &mut Vec<Hit>) -> usize {
        if max_hits == 0 {
            return 0;
        }
        let rapier = rapier_ray(ray);
        let filter = QueryFilter::default().groups(query_groups(mask));
        let mut count = 0;

        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &rapier,
            ray.max_distance,
            true,
            filter,
            |collider, intersection: RayIntersection| {
                out.push(self.to_hit(&rapier, collider, intersection));
                count += 1;
                count < max_hits // Stop once the buffer is full
            },
        );

        count
    }
}
