//! The sandbox scene: a hecs world of game objects over a rapier world.
//!
//! The scene is the host for every library capability. It instantiates
//! pooled visuals as entities, answers collider lookups for the hit
//! resolver and applies the damage and impulses it reports.

use std::collections::HashMap;

use combat::{
    AmmoType, BeamShot, BodyId, CharacterId, CharacterTarget, ColliderId, DamageRegionId,
    EntityDirectory, Hit, HitEvent, HitOutcome, HitResolver, ProjectileShot, ReceiverId,
};
use engine_core::{Health, Transform, Vec3};
use hecs::{Entity, World};
use physics::{body_handle, collider_handle, CollisionLayer, PhysicsBody, PhysicsWorld};
use pooling::{InstanceHandle, PrototypeFactory, PrototypeId};
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle, RigidBodySet};

/// Mass used to turn weapon impulses into character knockback.
const CHARACTER_MASS: f32 = 80.0;
/// Fraction of knockback velocity lost per second.
const KNOCKBACK_DAMPING: f32 = 4.0;

/// A character's root. Its collider stands in for the whole body.
#[derive(Debug, Clone)]
pub struct Character {
    pub faction_id: i32,
    pub num_damage_regions: usize,
    /// Damage taken per region, indexed by region id.
    pub region_damage: Vec<f32>,
}

/// One independently damageable part of a character.
#[derive(Debug, Clone, Copy)]
pub struct DamageRegion {
    pub owner: Entity,
    pub region: u32,
    /// Whether weapons may hit this collider right now.
    pub hittable: bool,
}

/// Knockback velocity (m/s) from hits. The character slides with it while it
/// decays in [`Scene::step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Knockback(pub Vec3);

/// A non-character object that accepts damage.
#[derive(Debug, Clone, Copy)]
pub struct Target;

/// Instance created for a pool.
#[derive(Debug, Clone, Copy)]
pub struct PooledVisual {
    pub prototype: PrototypeId,
    pub active: bool,
    pub paused: bool,
}

pub fn character_id(entity: Entity) -> CharacterId {
    CharacterId(entity.to_bits().get())
}

pub fn entity_of(id: u64) -> Option<Entity> {
    Entity::from_bits(id)
}

/// Physics plus game objects.
pub struct Scene {
    pub world: World,
    pub physics: PhysicsWorld,
    colliders: HashMap<ColliderHandle, Entity>,
    pending_impulses: Vec<(RigidBodyHandle, Vec3, Vec3)>,
    hits: Vec<HitEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            physics: PhysicsWorld::new(),
            colliders: HashMap::new(),
            pending_impulses: Vec::new(),
            hits: Vec::new(),
        }
    }

    /// Spawn a character with a capsule root and one sphere collider per
    /// damage region, given as (offset, radius) pairs.
    pub fn spawn_character(
        &mut self,
        position: Vec3,
        faction_id: i32,
        health: f32,
        regions: &[(Vec3, f32)],
    ) -> Entity {
        let body = self.physics.add_kinematic_body(position);
        let root = self
            .physics
            .add_capsule_collider(body, 0.5, 0.4, CollisionLayer::Character);
        let entity = self.world.spawn((
            Transform::from_position(position),
            Health::new(health),
            Knockback::default(),
            Character {
                faction_id,
                num_damage_regions: regions.len().max(1),
                region_damage: vec![0.0; regions.len().max(1)],
            },
            PhysicsBody::with_collider(body, root),
        ));
        self.colliders.insert(root, entity);

        for (i, (offset, radius)) in regions.iter().enumerate() {
            let collider = self
                .physics
                .add_sphere_collider(body, *offset, *radius, CollisionLayer::Character);
            let region = self.world.spawn((DamageRegion {
                owner: entity,
                region: i as u32,
                hittable: true,
            },));
            self.colliders.insert(collider, region);
        }
        entity
    }

    /// Static box that takes damage through hit events.
    pub fn spawn_target(&mut self, position: Vec3, half_extents: Vec3, health: f32) -> Entity {
        let body = self.physics.add_static_body(position);
        let collider = self
            .physics
            .add_box_collider(body, half_extents, CollisionLayer::Target);
        let entity = self.world.spawn((
            Transform::from_position(position),
            Health::new(health),
            Target,
            PhysicsBody::with_collider(body, collider),
        ));
        self.colliders.insert(collider, entity);
        entity
    }

    /// Loose dynamic crate that projectiles push around.
    pub fn spawn_prop(&mut self, position: Vec3, half_extents: Vec3) -> Entity {
        let body = self.physics.add_dynamic_body(position);
        let collider = self
            .physics
            .add_box_collider(body, half_extents, CollisionLayer::Debris);
        let entity = self.world.spawn((
            Transform::from_position(position),
            PhysicsBody::with_collider(body, collider),
        ));
        self.colliders.insert(collider, entity);
        entity
    }

    /// Sensor volume with no game object behind it.
    pub fn add_trigger_zone(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        let body = self.physics.add_static_body(position);
        self.physics
            .add_sensor_box(body, Vec3::ZERO, half_extents, CollisionLayer::Trigger)
    }

    pub fn add_wall(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        self.physics.add_static_cuboid(position, half_extents)
    }

    /// Kinematic platform body driven from a motion profile.
    pub fn spawn_platform(&mut self, position: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let body = self.physics.add_kinematic_body(position);
        let collider = self
            .physics
            .add_box_collider(body, half_extents, CollisionLayer::Platform);
        let entity = self.world.spawn((
            Transform::from_position(position),
            PhysicsBody::with_collider(body, collider),
        ));
        self.colliders.insert(collider, entity);
        body
    }

    /// Toggle whether weapons may hit one damage region collider.
    pub fn set_region_hittable(&mut self, collider: ColliderHandle, hittable: bool) {
        if let Some(entity) = self.colliders.get(&collider) {
            if let Ok(mut region) = self.world.get::<&mut DamageRegion>(*entity) {
                region.hittable = hittable;
            }
        }
    }

    /// Colliders of a character's damage regions, in region order.
    pub fn region_colliders(&self, character: Entity) -> Vec<ColliderHandle> {
        let mut regions: Vec<(u32, ColliderHandle)> = self
            .colliders
            .iter()
            .filter_map(|(collider, entity)| {
                let region = self.world.get::<&DamageRegion>(*entity).ok()?;
                (region.owner == character).then_some((region.region, *collider))
            })
            .collect();
        regions.sort_by_key(|(region, _)| *region);
        regions.into_iter().map(|(_, collider)| collider).collect()
    }

    /// Refresh ray queries after building or moving things between steps.
    pub fn refresh_queries(&mut self) {
        self.physics.update_query_pipeline();
    }

    pub fn step(&mut self, dt: f32) {
        if dt > 0.0 {
            self.apply_knockback(dt);
        }
        self.physics.step(dt);
        for (_entity, (transform, body)) in self.world.query_mut::<(&mut Transform, &PhysicsBody)>() {
            if let Some(t) = self.physics.get_body_transform(body.rigid_body) {
                transform.position = t.position;
                transform.rotation = t.rotation;
            }
        }
    }

    /// Slide knocked-back characters and let their knockback die out.
    fn apply_knockback(&mut self, dt: f32) {
        for (_entity, (knockback, body)) in self.world.query_mut::<(&mut Knockback, &PhysicsBody)>() {
            if knockback.0 == Vec3::ZERO {
                continue;
            }
            if let Some(mut placement) = self.physics.get_body_transform(body.rigid_body) {
                placement.position += knockback.0 * dt;
                self.physics.set_body_transform(body.rigid_body, &placement);
            }
            knockback.0 *= (1.0 - KNOCKBACK_DAMPING * dt).max(0.0);
            if knockback.0.length_squared() < 1e-6 {
                knockback.0 = Vec3::ZERO;
            }
        }
    }

    pub fn resolve_projectile(&mut self, resolver: &mut HitResolver, shot: &ProjectileShot) -> HitOutcome {
        let mut directory = SceneDirectory {
            world: &mut self.world,
            bodies: &self.physics.rigid_body_set,
            colliders: &self.colliders,
            impulses: &mut self.pending_impulses,
            hits: &mut self.hits,
        };
        let outcome = resolver.resolve_projectile(shot, &self.physics, &mut directory);
        self.flush_impulses();
        outcome
    }

    pub fn resolve_beam(&mut self, resolver: &mut HitResolver, shot: &BeamShot) -> HitOutcome {
        let mut directory = SceneDirectory {
            world: &mut self.world,
            bodies: &self.physics.rigid_body_set,
            colliders: &self.colliders,
            impulses: &mut self.pending_impulses,
            hits: &mut self.hits,
        };
        let outcome = resolver.resolve_beam(shot, &self.physics, &mut directory);
        self.flush_impulses();
        outcome
    }

    /// Hit events raised since the last call.
    pub fn take_hits(&mut self) -> Vec<HitEvent> {
        std::mem::take(&mut self.hits)
    }

    fn flush_impulses(&mut self) {
        for (body, impulse, point) in self.pending_impulses.drain(..) {
            self.physics.apply_impulse_at_point(body, impulse, point);
        }
    }

    fn instance_entity(instance: InstanceHandle) -> Option<Entity> {
        entity_of(instance.0)
    }
}

impl PrototypeFactory for Scene {
    fn instantiate(&mut self, prototype: PrototypeId) -> Option<InstanceHandle> {
        let entity = self.world.spawn((
            PooledVisual {
                prototype,
                active: false,
                paused: false,
            },
            Transform::default(),
        ));
        Some(InstanceHandle(entity.to_bits().get()))
    }

    fn set_active(&mut self, instance: InstanceHandle, active: bool) {
        if let Some(entity) = Self::instance_entity(instance) {
            if let Ok(mut visual) = self.world.get::<&mut PooledVisual>(entity) {
                visual.active = active;
                visual.paused = false;
            }
        }
    }

    fn set_transform(&mut self, instance: InstanceHandle, transform: &Transform) {
        if let Some(entity) = Self::instance_entity(instance) {
            if let Ok(mut t) = self.world.get::<&mut Transform>(entity) {
                *t = *transform;
            }
        }
    }

    fn pause(&mut self, instance: InstanceHandle) {
        if let Some(entity) = Self::instance_entity(instance) {
            if let Ok(mut visual) = self.world.get::<&mut PooledVisual>(entity) {
                visual.paused = true;
            }
        }
    }

    fn resume(&mut self, instance: InstanceHandle) {
        if let Some(entity) = Self::instance_entity(instance) {
            if let Ok(mut visual) = self.world.get::<&mut PooledVisual>(entity) {
                visual.paused = false;
            }
        }
    }

    fn destroy(&mut self, instance: InstanceHandle) {
        if let Some(entity) = Self::instance_entity(instance) {
            self.world.despawn(entity).ok();
        }
    }
}

/// Borrowed view of the scene handed to the resolver while the physics
/// world is borrowed for ray queries. Rigid body impulses are queued and
/// applied once the cast is resolved.
struct SceneDirectory<'a> {
    world: &'a mut World,
    bodies: &'a RigidBodySet,
    colliders: &'a HashMap<ColliderHandle, Entity>,
    impulses: &'a mut Vec<(RigidBodyHandle, Vec3, Vec3)>,
    hits: &'a mut Vec<HitEvent>,
}

impl SceneDirectory<'_> {
    fn entity(&self, collider: ColliderId) -> Option<Entity> {
        self.colliders.get(&collider_handle(collider)).copied()
    }
}

impl EntityDirectory for SceneDirectory<'_> {
    fn character(&self, hit: &Hit) -> Option<CharacterTarget> {
        let entity = self.entity(hit.collider)?;
        let (owner, region) = match self.world.get::<&DamageRegion>(entity) {
            Ok(region) => (region.owner, Some(DamageRegionId(region.region))),
            Err(_) => (entity, None),
        };
        let character = self.world.get::<&Character>(owner).ok()?;
        Some(CharacterTarget {
            id: character_id(owner),
            faction_id: character.faction_id,
            num_damage_regions: character.num_damage_regions,
            region,
        })
    }

    fn is_collider_hittable(&self, character: CharacterId, collider: ColliderId) -> bool {
        let alive = entity_of(character.0)
            .and_then(|e| self.world.get::<&Health>(e).ok().map(|h| !h.is_dead()))
            .unwrap_or(false);
        let region_hittable = self
            .entity(collider)
            .and_then(|e| self.world.get::<&DamageRegion>(e).ok().map(|r| r.hittable))
            .unwrap_or(true);
        alive && region_hittable
    }

    fn damage_receiver(&self, hit: &Hit) -> Option<ReceiverId> {
        let entity = self.entity(hit.collider)?;
        self.world
            .get::<&Target>(entity)
            .ok()
            .map(|_| ReceiverId(entity.to_bits().get()))
    }

    fn dynamic_body(&self, hit: &Hit) -> Option<BodyId> {
        let body = hit.body?;
        self.bodies
            .get(body_handle(body))
            .filter(|b| b.is_dynamic())
            .map(|_| body)
    }

    fn apply_damage(
        &mut self,
        character: CharacterId,
        region: DamageRegionId,
        amount: f32,
        ammo_type: AmmoType,
        _point: Vec3,
    ) {
        let Some(entity) = entity_of(character.0) else {
            return;
        };
        if let Ok((health, state)) = self.world.query_one_mut::<(&mut Health, &mut Character)>(entity) {
            health.take_damage(amount);
            if let Some(total) = state.region_damage.get_mut(region.0 as usize) {
                *total += amount;
            }
            log::debug!(
                "Character {:?} region {} took {:.1} ({}), {:.0}% left",
                entity,
                region.0,
                amount,
                ammo_type.letter(),
                health.percentage() * 100.0
            );
        }
    }

    fn apply_impulse(&mut self, character: CharacterId, direction: Vec3, magnitude: f32, _point: Vec3) {
        if let Some(entity) = entity_of(character.0) {
            if let Ok(mut knockback) = self.world.get::<&mut Knockback>(entity) {
                knockback.0 += direction * magnitude / CHARACTER_MASS;
            }
        }
    }

    fn apply_impulse_at_point(&mut self, body: BodyId, impulse: Vec3, point: Vec3) {
        self.impulses.push((body_handle(body), impulse, point));
    }

    fn on_hit(&mut self, event: &HitEvent) {
        if let HitEvent::Object(params) = event {
            if let Some(entity) = entity_of(params.receiver.0) {
                if let Ok(mut health) = self.world.get::<&mut Health>(entity) {
                    health.take_damage(params.damage);
                }
            }
        }
        self.hits.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat::{AmmoTable, CastSource, HitKind, LayerMask, Ray};
    use physics::body_id;
    use pooling::{PoolCategory, PoolRegistry, PrototypeSpec, SceneId};

    fn entity_body(world: &World, entity: Entity) -> Option<BodyId> {
        world
            .get::<&PhysicsBody>(entity)
            .ok()
            .map(|b| body_id(b.rigid_body))
    }

    fn shot_from(origin: Vec3, source: CastSource) -> ProjectileShot {
        ProjectileShot {
            ray: Ray::new(origin, Vec3::NEG_Z, 50.0).unwrap(),
            mask: LayerMask::ALL,
            source,
            base_damage: 10.0,
            base_impulse: 2.0,
            ammo_type: AmmoType::A,
        }
    }

    fn soldier(scene: &mut Scene) -> Entity {
        scene.spawn_character(
            Vec3::new(0.0, 1.0, -10.0),
            2,
            100.0,
            &[(Vec3::new(0.0, 0.2, 0.0), 0.3), (Vec3::new(0.0, 0.7, 0.0), 0.2)],
        )
    }

    #[test]
    fn root_capsule_passes_through_to_region() {
        let mut scene = Scene::new();
        let soldier = soldier(&mut scene);
        scene.add_trigger_zone(Vec3::new(0.0, 1.0, -5.0), Vec3::new(2.0, 2.0, 0.5));
        scene.refresh_queries();
        let mut resolver = HitResolver::new(AmmoTable::new());

        let outcome = scene.resolve_projectile(&mut resolver, &shot_from(Vec3::new(0.0, 1.0, 0.0), CastSource::default()));
        assert_eq!(
            outcome.resolved.unwrap().kind,
            HitKind::Character {
                character: character_id(soldier),
                region: DamageRegionId(0)
            }
        );
        let health = *scene.world.get::<&Health>(soldier).unwrap();
        assert_eq!(health.current, 90.0);
        let knockback = scene.world.get::<&Knockback>(soldier).unwrap().0;
        assert!((knockback - Vec3::new(0.0, 0.0, -2.0 / CHARACTER_MASS)).length() < 1e-6);
        assert_eq!(scene.take_hits().len(), 1);
    }

    #[test]
    fn own_shots_pass_through_the_shooter() {
        let mut scene = Scene::new();
        let soldier = soldier(&mut scene);
        let target = scene.spawn_target(Vec3::new(0.0, 1.0, -20.0), Vec3::splat(1.0), 50.0);
        scene.refresh_queries();
        let mut resolver = HitResolver::new(AmmoTable::new());

        let source = CastSource::character(character_id(soldier), 2);
        let outcome = scene.resolve_projectile(&mut resolver, &shot_from(Vec3::new(0.0, 1.0, 0.0), source));
        assert!(matches!(outcome.resolved.unwrap().kind, HitKind::DamageReceiver(_)));
        assert_eq!(scene.world.get::<&Health>(soldier).unwrap().current, 100.0);
        assert_eq!(scene.world.get::<&Health>(target).unwrap().current, 40.0);
    }

    #[test]
    fn projectile_pushes_prop() {
        let mut scene = Scene::new();
        scene.physics.gravity = rapier3d::prelude::vector![0.0, 0.0, 0.0];
        let prop = scene.spawn_prop(Vec3::new(0.0, 1.0, -8.0), Vec3::splat(0.5));
        scene.refresh_queries();
        let mut resolver = HitResolver::new(AmmoTable::new());

        let outcome = scene.resolve_projectile(&mut resolver, &shot_from(Vec3::new(0.0, 1.0, 0.0), CastSource::default()));
        assert_eq!(outcome.resolved.unwrap().kind, HitKind::DynamicBody(entity_body(&scene.world, prop).unwrap()));
        for _ in 0..10 {
            scene.step(1.0 / 60.0);
        }
        assert!(scene.world.get::<&Transform>(prop).unwrap().position.z < -8.0);
    }

    #[test]
    fn unhittable_region_is_skipped() {
        let mut scene = Scene::new();
        let soldier = soldier(&mut scene);
        let chest = scene.region_colliders(soldier)[0];
        scene.set_region_hittable(chest, false);
        scene.refresh_queries();
        let mut resolver = HitResolver::new(AmmoTable::new());

        let outcome = scene.resolve_projectile(&mut resolver, &shot_from(Vec3::new(0.0, 1.0, 0.0), CastSource::default()));
        assert!(!outcome.is_hit());
        assert_eq!(scene.world.get::<&Health>(soldier).unwrap().current, 100.0);
    }

    #[test]
    fn pooled_instances_are_entities() {
        let mut scene = Scene::new();
        let mut registry = PoolRegistry::new(SceneId(1));
        let template = registry
            .get_or_create_pool(PoolCategory::Effects, &PrototypeSpec::new(PrototypeId(5), 2, 2), &mut scene)
            .unwrap();
        let placement = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let item = registry
            .spawn(PoolCategory::Effects, template, &placement, &mut scene)
            .unwrap();

        let entity = entity_of(item.instance.0).unwrap();
        assert!(scene.world.get::<&PooledVisual>(entity).unwrap().active);
        assert_eq!(scene.world.get::<&Transform>(entity).unwrap().position, placement.position);

        registry.pause_all(PoolCategory::Effects, &mut scene);
        assert!(scene.world.get::<&PooledVisual>(entity).unwrap().paused);

        registry.clear(&mut scene);
        assert!(!scene.world.contains(entity));
    }

    #[test]
    fn knockback_slides_character_then_dies_out() {
        let mut scene = Scene::new();
        let soldier = soldier(&mut scene);
        scene.world.get::<&mut Knockback>(soldier).unwrap().0 = Vec3::new(1.0, 0.0, 0.0);

        for _ in 0..120 {
            scene.step(1.0 / 60.0);
        }
        let moved = scene.world.get::<&Transform>(soldier).unwrap().position;
        // Total slide is velocity / damping.
        assert!(moved.x > 0.2 && moved.x < 0.26, "slid to {}", moved.x);
        assert!((moved.z + 10.0).abs() < 1e-4);
        assert_eq!(scene.world.get::<&Knockback>(soldier).unwrap().0, Vec3::ZERO);
    }
}
