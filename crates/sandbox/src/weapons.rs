//! Weapons fired through the hit resolver.

use combat::{AmmoType, BeamShot, CastSource, HitOutcome, HitResolver, LayerMask, ProjectileShot, Ray};
use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Instant per-shot damage and impulse.
    Projectile,
    /// Continuous damage while held on target.
    Beam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub name: String,
    pub kind: WeaponKind,
    pub base_damage: f32,
    pub base_impulse: f32,
    /// Beam damage per second of contact.
    pub damage_per_second: f32,
    pub range: f32,
    pub spread_degrees: f32,
    /// Shots (or beam updates) per second.
    pub fire_rate: f32,
    /// Ammo letter, `'A'` to `'Z'`.
    pub ammo: char,
}

/// Weapon instance with current state.
#[derive(Debug, Clone)]
pub struct Weapon {
    pub config: WeaponConfig,
    pub ammo_type: AmmoType,
    pub fire_cooldown: f32,
    pub shots_fired: u32,
}

impl Weapon {
    pub fn new(config: WeaponConfig) -> Self {
        let ammo_type = AmmoType::from_letter(config.ammo).unwrap_or_else(|| {
            log::warn!("Weapon {} has unknown ammo {:?}, using A", config.name, config.ammo);
            AmmoType::A
        });
        Self {
            config,
            ammo_type,
            fire_cooldown: 0.0,
            shots_fired: 0,
        }
    }

    /// Update weapon state.
    pub fn update(&mut self, dt: f32) {
        if self.fire_cooldown > 0.0 {
            self.fire_cooldown -= dt;
        }
    }

    /// Check if weapon can fire.
    pub fn can_fire(&self) -> bool {
        self.fire_cooldown <= 0.0
    }

    /// Seconds between shots.
    pub fn interval(&self) -> f32 {
        if self.config.fire_rate > 0.0 {
            1.0 / self.config.fire_rate
        } else {
            f32::INFINITY
        }
    }

    /// Fire the weapon, starting the cooldown.
    pub fn fire(&mut self) -> bool {
        if !self.can_fire() {
            return false;
        }
        self.fire_cooldown = self.interval();
        self.shots_fired += 1;
        true
    }
}

/// Aims and fires weapons at the scene.
pub struct WeaponSystem {
    rng: StdRng,
    mask: LayerMask,
}

impl WeaponSystem {
    pub fn new(seed: u64, mask: LayerMask) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            mask,
        }
    }

    /// Fire `weapon` if it is ready. Returns `None` when it is cooling down
    /// or the aim is degenerate.
    pub fn fire(
        &mut self,
        weapon: &mut Weapon,
        origin: Vec3,
        direction: Vec3,
        source: CastSource,
        scene: &mut Scene,
        resolver: &mut HitResolver,
    ) -> Option<HitOutcome> {
        if !weapon.fire() {
            return None;
        }
        let direction = self.apply_spread(direction, weapon.config.spread_degrees);
        let ray = Ray::new(origin, direction, weapon.config.range)?;

        let outcome = match weapon.config.kind {
            WeaponKind::Projectile => scene.resolve_projectile(
                resolver,
                &ProjectileShot {
                    ray,
                    mask: self.mask,
                    source,
                    base_damage: weapon.config.base_damage,
                    base_impulse: weapon.config.base_impulse,
                    ammo_type: weapon.ammo_type,
                },
            ),
            WeaponKind::Beam => scene.resolve_beam(
                resolver,
                &BeamShot {
                    ray,
                    mask: self.mask,
                    source,
                    damage_per_second: weapon.config.damage_per_second,
                    hit_duration: weapon.interval().min(1.0),
                    ammo_type: weapon.ammo_type,
                },
            ),
        };
        Some(outcome)
    }

    /// Jitter a direction by up to `spread` degrees on two axes.
    fn apply_spread(&mut self, direction: Vec3, spread: f32) -> Vec3 {
        let spread_rad = spread.to_radians();
        if spread_rad <= 0.0 {
            return direction;
        }
        let spread_x = self.rng.gen_range(-spread_rad..spread_rad);
        let spread_y = self.rng.gen_range(-spread_rad..spread_rad);

        let spread_rotation = Quat::from_euler(EulerRot::XYZ, spread_x, spread_y, 0.0);
        spread_rotation * direction
    }
}
