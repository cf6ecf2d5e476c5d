//! The fixed-step sandbox run.

use anyhow::{Context, Result};
use combat::{CastSource, HitOutcome, HitResolver, ImpactSpawner};
use engine_core::{Clock, Health, RandomSequence, Time, Transform, Vec3};
use hecs::Entity;
use motion::MotionPhase;
use pooling::{PoolCategory, PoolRegistry, PooledItemKey, SceneId};

use crate::config::SandboxConfig;
use crate::platform::PlatformDriver;
use crate::scene::{character_id, Scene};
use crate::weapons::{Weapon, WeaponKind, WeaponSystem};

const SHOOTER_FACTION: i32 = 1;
const ENEMY_FACTION: i32 = 2;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u32,
    pub shots: u32,
    pub hits: u32,
    pub hit_events: u32,
    pub decals: u32,
    pub effects: u32,
    pub expired: u32,
    pub platform_arrivals: u32,
}

pub struct Sandbox {
    config: SandboxConfig,
    time: Time,
    scene: Scene,
    registry: PoolRegistry,
    resolver: HitResolver,
    spawner: ImpactSpawner,
    rng: RandomSequence,
    weapons: Vec<Weapon>,
    weapon_system: WeaponSystem,
    platform: PlatformDriver,
    beam_template: usize,
    beam_visual: PooledItemKey,
    shooter: Entity,
    targets: Vec<Vec3>,
    next_target: usize,
    stats: RunStats,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let mut scene = Scene::new();
        let mut registry = PoolRegistry::new(SceneId(0));

        let mut decals = Vec::with_capacity(config.decal_pools.len());
        for spec in &config.decal_pools {
            let template = registry
                .get_or_create_pool(PoolCategory::Decals, spec, &mut scene)
                .context("registering decal pool")?;
            decals.push(template);
        }
        let effect = registry
            .get_or_create_pool(PoolCategory::Effects, &config.effect_pool, &mut scene)
            .context("registering effect pool")?;
        let beam_template = registry
            .get_or_create_pool(PoolCategory::Beams, &config.beam_pool, &mut scene)
            .context("registering beam pool")?;

        let shooter = scene.spawn_character(Vec3::new(0.0, 1.0, 0.0), SHOOTER_FACTION, 100.0, &[]);
        let targets = build_range(&mut scene);

        let platform = PlatformDriver::new(
            &mut scene,
            config.platform.clone(),
            config.follower_pid,
            config.follower_ramp,
        );
        scene.refresh_queries();

        let mut time = Time::new();
        time.set_fixed_rate(config.tick_rate);

        log::info!(
            "Sandbox ready: {} decal pools, {} weapons, {} targets",
            decals.len(),
            config.weapons.len(),
            targets.len()
        );

        Ok(Self {
            time,
            resolver: HitResolver::new(config.ammo_table()),
            spawner: ImpactSpawner::new(config.impact)
                .with_decals(decals)
                .with_effect(effect),
            rng: RandomSequence::new(config.seed),
            weapons: config.weapons.iter().cloned().map(Weapon::new).collect(),
            weapon_system: WeaponSystem::new(config.seed as u64, physics::weapon_mask()),
            scene,
            registry,
            platform,
            beam_template,
            beam_visual: PooledItemKey::INVALID,
            shooter,
            targets,
            next_target: 0,
            stats: RunStats::default(),
            config,
        })
    }

    pub fn run(&mut self) -> RunStats {
        for _ in 0..self.config.ticks {
            self.step();
        }
        self.stats
    }

    /// One fixed step.
    pub fn step(&mut self) {
        self.time.advance_fixed();
        let dt = self.time.delta_seconds();
        let tick = self.stats.ticks;
        self.stats.ticks += 1;

        self.drive_platform(tick, dt);
        self.fire_weapons(dt);

        self.stats.expired += self.registry.tick(dt, &mut self.scene) as u32;
        self.scene.step(dt);
        self.stats.hit_events += self.scene.take_hits().len() as u32;
    }

    /// Exercise the platform controls over the run: a smooth stop a third of
    /// the way in and a smooth restart half way.
    fn drive_platform(&mut self, tick: u32, dt: f32) {
        let ticks = self.config.ticks;
        if tick == ticks / 3 {
            log::info!("Platform smooth stop requested");
            self.platform.profile_mut().smooth_stop();
        } else if tick == ticks / 2 && self.platform.profile().phase() == MotionPhase::Stopped {
            log::info!("Platform smooth start requested");
            self.platform.profile_mut().smooth_start();
        }
        self.platform.update(&mut self.scene, dt);
        self.stats.platform_arrivals = self.platform.arrivals();
    }

    fn fire_weapons(&mut self, dt: f32) {
        let origin = match self.scene.world.get::<&Transform>(self.shooter) {
            Ok(t) => t.position,
            Err(_) => return,
        };
        let source = CastSource::character(character_id(self.shooter), SHOOTER_FACTION);

        for i in 0..self.weapons.len() {
            self.weapons[i].update(dt);
            if !self.weapons[i].can_fire() || self.targets.is_empty() {
                continue;
            }

            let aim = self.targets[self.next_target % self.targets.len()];
            let kind = self.weapons[i].config.kind;
            if kind == WeaponKind::Projectile {
                self.next_target += 1;
            }

            let Some(outcome) = self.weapon_system.fire(
                &mut self.weapons[i],
                origin,
                aim - origin,
                source,
                &mut self.scene,
                &mut self.resolver,
            ) else {
                continue;
            };
            self.stats.shots += 1;

            if kind == WeaponKind::Beam {
                self.place_beam(origin, &outcome);
            }
            self.record_impact(&outcome);
        }
    }

    fn record_impact(&mut self, outcome: &HitOutcome) {
        let Some(candidate) = outcome.resolved else {
            return;
        };
        self.stats.hits += 1;
        let spawns = self
            .spawner
            .spawn_for(&candidate, &mut self.registry, &mut self.scene, &mut self.rng);
        if spawns.decal.is_some() {
            self.stats.decals += 1;
        }
        if spawns.effect.is_some() {
            self.stats.effects += 1;
        }
    }

    /// Stretch the pooled beam visual from the muzzle to the beam's end,
    /// spawning a fresh one if the previous one expired.
    fn place_beam(&mut self, origin: Vec3, outcome: &HitOutcome) {
        let direction = outcome.end_point - origin;
        let mut placement = Transform::facing(origin + direction * 0.5, direction, 0.0);
        placement.scale = Vec3::new(1.0, 1.0, direction.length());

        if !self.registry.move_item(&self.beam_visual, &placement, &mut self.scene) {
            self.beam_visual = self
                .registry
                .spawn(PoolCategory::Beams, self.beam_template, &placement, &mut self.scene)
                .map(|item| item.key)
                .unwrap_or(PooledItemKey::INVALID);
        }
    }

    /// Log how the run went.
    pub fn report(&self) {
        let s = &self.stats;
        log::info!(
            "{} ticks ({:.1}s): {} shots, {} hits, {} hit events",
            s.ticks,
            self.time.elapsed_seconds(),
            s.shots,
            s.hits,
            s.hit_events
        );
        log::info!(
            "Impacts: {} decals, {} effects spawned, {} expired",
            s.decals,
            s.effects,
            s.expired
        );
        for category in [PoolCategory::Decals, PoolCategory::Effects, PoolCategory::Beams] {
            let active: usize = (0..self.registry.template_count(category))
                .map(|i| self.registry.active_count(category, i))
                .sum();
            log::info!("{} pool: {} active", category.name(), active);
        }
        for (entity, health) in self.scene.world.query::<&Health>().iter() {
            log::info!("{:?} health {:.0}%", entity, health.percentage() * 100.0);
        }
        log::info!(
            "Platform: {} arrivals, phase {:?}; follower at x = {:.2}",
            s.platform_arrivals,
            self.platform.profile().phase(),
            self.platform.follower.position
        );
    }
}

/// Lay out the firing range and return the aim points.
fn build_range(scene: &mut Scene) -> Vec<Vec3> {
    scene.physics.add_ground_plane();
    scene.add_wall(Vec3::new(0.0, 3.0, -30.0), Vec3::new(15.0, 3.0, 0.5));
    scene.add_trigger_zone(Vec3::new(0.0, 1.0, -4.0), Vec3::new(6.0, 2.0, 0.25));

    let enemy_at = Vec3::new(0.0, 1.0, -15.0);
    scene.spawn_character(
        enemy_at,
        ENEMY_FACTION,
        250.0,
        &[(Vec3::new(0.0, 0.2, 0.0), 0.3), (Vec3::new(0.0, 0.7, 0.0), 0.2)],
    );
    let target_at = Vec3::new(-4.0, 1.0, -20.0);
    scene.spawn_target(target_at, Vec3::new(1.0, 1.0, 0.25), 500.0);
    let prop_at = Vec3::new(4.0, 0.5, -10.0);
    scene.spawn_prop(prop_at, Vec3::splat(0.5));

    vec![enemy_at + Vec3::new(0.0, 0.2, 0.0), target_at, prop_at]
}
