//! Rapier world hosting the firing range: bodies, layered colliders and the
//! query pipeline used for weapon casts.

use crate::collision::CollisionLayer;
use engine_core::{Transform, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_rotation(q: glam::Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// Rapier sets and pipelines for one scene.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world with earth gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Advance the simulation. A non-positive `dt` reuses the previous step length.
    pub fn step(&mut self, dt: f32) {
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
        }
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Refresh the query pipeline after adding or moving colliders outside
    /// of [`step`](Self::step).
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Body pushed around by weapon impulses.
    pub fn add_dynamic_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Body moved only from code (characters, moving platforms).
    pub fn add_kinematic_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Immovable body for damage receivers and scenery.
    pub fn add_static_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::fixed()
            .translation(to_vector(position))
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Solid box on `layer`, centred on the body.
    pub fn add_box_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_extents: Vec3,
        layer: CollisionLayer,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(layer.groups())
            .build();
        self.collider_set.insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a box sensor (trigger) to a rigid body, offset in body space.
    pub fn add_sensor_box(
        &mut self,
        body_handle: RigidBodyHandle,
        offset: Vec3,
        half_extents: Vec3,
        layer: CollisionLayer,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(offset))
            .sensor(true)
            .collision_groups(layer.groups())
            .build();
        self.collider_set.insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a sphere collider, offset in body space. Used for damage regions.
    pub fn add_sphere_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        offset: Vec3,
        radius: f32,
        layer: CollisionLayer,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .translation(to_vector(offset))
            .collision_groups(layer.groups())
            .build();
        self.collider_set.insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Upright capsule, used as a character's root collider.
    pub fn add_capsule_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_height: f32,
        radius: f32,
        layer: CollisionLayer,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .collision_groups(layer.groups())
            .build();
        self.collider_set.insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Floor at y = 0.
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(CollisionLayer::Environment.groups())
            .build();
        self.collider_set.insert(collider)
    }

    /// Fixed wall or block with no parent body.
    pub fn add_static_cuboid(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(center))
            .collision_groups(CollisionLayer::Environment.groups())
            .build();
        self.collider_set.insert(collider)
    }

    /// Current placement of a body, or `None` for a stale handle.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Teleport a body. Kinematic bodies are moved on the next step.
    pub fn set_body_transform(&mut self, handle: RigidBodyHandle, transform: &Transform) {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            log::debug!("set_body_transform on missing body {:?}", handle);
            return;
        };
        let isometry = Isometry::from_parts(to_vector(transform.position).into(), to_rotation(transform.rotation));
        if body.is_kinematic() {
            body.set_next_kinematic_position(isometry);
        } else {
            body.set_position(isometry, true);
        }
    }

    /// Push a dynamic body at a world point. Other body types are left alone.
    pub fn apply_impulse_at_point(&mut self, handle: RigidBodyHandle, impulse: Vec3, point: Vec3) {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) if body.is_dynamic() => {
                body.apply_impulse_at_point(to_vector(impulse), point![point.x, point.y, point.z], true);
            }
            Some(_) => {}
            None => log::debug!("Impulse on missing body {:?}", handle),
        }
    }

    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.get(handle).is_some_and(|b| b.is_dynamic())
    }
}
