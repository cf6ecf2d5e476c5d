//! What the resolver needs to know about hit colliders, and where it sends
//! damage and hit notifications.

use glam::Vec3;

use crate::{AmmoType, BodyId, ColliderId, Hit};

/// Host reference to a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacterId(pub u64);

/// Host reference to a non-character object that accepts damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(pub u64);

/// A character's damage region. Region 0 is the main body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DamageRegionId(pub u32);

impl DamageRegionId {
    pub const MAIN: DamageRegionId = DamageRegionId(0);
}

/// Character ownership of a hit collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterTarget {
    pub id: CharacterId,
    pub faction_id: i32,
    pub num_damage_regions: usize,
    /// Region the collider belongs to. `None` means the character's root
    /// collider.
    pub region: Option<DamageRegionId>,
}

/// Who fired.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CastSource {
    pub character: Option<CharacterId>,
    pub faction_id: i32,
}

impl CastSource {
    pub fn character(id: CharacterId, faction_id: i32) -> Self {
        Self {
            character: Some(id),
            faction_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotKind {
    Projectile,
    Beam,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterHitParameters {
    pub character: CharacterId,
    pub region: DamageRegionId,
    pub hit_point: Vec3,
    pub hit_normal: Vec3,
    pub direction: Vec3,
    pub damage: f32,
    pub impulse: f32,
    pub ammo_type: AmmoType,
    pub source: CastSource,
    pub kind: ShotKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectHitParameters {
    pub receiver: ReceiverId,
    pub collider: ColliderId,
    pub hit_point: Vec3,
    pub hit_normal: Vec3,
    pub direction: Vec3,
    pub damage: f32,
    pub impulse: f32,
    pub ammo_type: AmmoType,
    pub source: CastSource,
    pub kind: ShotKind,
}

/// Delivered once per resolved hit on a character or damage receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitEvent {
    Character(CharacterHitParameters),
    Object(ObjectHitParameters),
}

/// Lookups from colliders to game objects, plus the sinks for damage,
/// impulses and hit events.
pub trait EntityDirectory {
    /// The character that owns the hit collider, if any.
    fn character(&self, hit: &Hit) -> Option<CharacterTarget>;

    /// Whether a character currently accepts hits on this collider.
    fn is_collider_hittable(&self, _character: CharacterId, _collider: ColliderId) -> bool {
        true
    }

    fn damage_receiver(&self, hit: &Hit) -> Option<ReceiverId>;

    /// Dynamic rigid body that projectiles should push.
    fn dynamic_body(&self, hit: &Hit) -> Option<BodyId>;

    fn apply_damage(
        &mut self,
        character: CharacterId,
        region: DamageRegionId,
        amount: f32,
        ammo_type: AmmoType,
        point: Vec3,
    );

    fn apply_impulse(&mut self, character: CharacterId, direction: Vec3, magnitude: f32, point: Vec3);

    fn apply_impulse_at_point(&mut self, body: BodyId, impulse: Vec3, point: Vec3);

    fn on_hit(&mut self, event: &HitEvent);
}
