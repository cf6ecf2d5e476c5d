//! Per-cast hit resolution for projectiles and beams.
//!
//! A cast produces at most one authoritative hit. Candidates are taken in
//! strictly increasing distance order and the walk stops at the first one
//! that is not ignored.

use glam::Vec3;

use crate::{
    AmmoTable, AmmoType, BodyId, CastSource, CharacterHitParameters, CharacterId, DamageRegionId,
    EntityDirectory, Hit, HitEvent, LayerMask, ObjectHitParameters, Ray, ReceiverId, ShotKind,
    SpatialQuery,
};

/// Hits considered per multi-hit query. Candidates past this are dropped.
pub const MAX_HIT_CANDIDATES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileShot {
    pub ray: Ray,
    pub mask: LayerMask,
    pub source: CastSource,
    pub base_damage: f32,
    pub base_impulse: f32,
    pub ammo_type: AmmoType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamShot {
    pub ray: Ray,
    pub mask: LayerMask,
    pub source: CastSource,
    pub damage_per_second: f32,
    /// Seconds of beam contact this resolution covers.
    pub hit_duration: f32,
    pub ammo_type: AmmoType,
}

/// How a candidate was classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitKind {
    Character {
        character: CharacterId,
        region: DamageRegionId,
    },
    DamageReceiver(ReceiverId),
    DynamicBody(BodyId),
    PlainGeometry,
    Ignored,
}

/// A hit plus its classification and the amounts applied for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitCandidate {
    pub hit: Hit,
    pub kind: HitKind,
    pub damage: f32,
    pub impulse: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub resolved: Option<HitCandidate>,
    /// Hit point, or the end of the ray on a miss.
    pub end_point: Vec3,
}

impl HitOutcome {
    fn miss(ray: &Ray) -> Self {
        Self {
            resolved: None,
            end_point: ray.end_point(),
        }
    }

    fn hit(candidate: HitCandidate) -> Self {
        Self {
            end_point: candidate.hit.point,
            resolved: Some(candidate),
        }
    }

    pub fn is_hit(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Which candidates may end the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    Any,
    CharactersOnly,
}

struct Cast {
    ray: Ray,
    mask: LayerMask,
    source: CastSource,
    ammo_type: AmmoType,
    kind: ShotKind,
    damage: f32,
    impulse: f32,
    filter: Filter,
}

/// Resolves casts against a [`SpatialQuery`], reusing one candidate buffer.
pub struct HitResolver {
    ammo: AmmoTable,
    candidates: Vec<Hit>,
}

impl HitResolver {
    pub fn new(ammo: AmmoTable) -> Self {
        Self {
            ammo,
            candidates: Vec::with_capacity(MAX_HIT_CANDIDATES),
        }
    }

    pub fn ammo(&self) -> &AmmoTable {
        &self.ammo
    }

    /// Resolve a projectile against anything it can hit.
    pub fn resolve_projectile<Q, D>(&mut self, shot: &ProjectileShot, query: &Q, directory: &mut D) -> HitOutcome
    where
        Q: SpatialQuery + ?Sized,
        D: EntityDirectory + ?Sized,
    {
        let cast = self.projectile_cast(shot, Filter::Any);
        self.resolve(&cast, query, directory)
    }

    /// Resolve a projectile that only affects characters. Solid geometry
    /// in front of the character still blocks it.
    pub fn resolve_character_hit<Q, D>(&mut self, shot: &ProjectileShot, query: &Q, directory: &mut D) -> HitOutcome
    where
        Q: SpatialQuery + ?Sized,
        D: EntityDirectory + ?Sized,
    {
        let cast = self.projectile_cast(shot, Filter::CharactersOnly);
        self.resolve(&cast, query, directory)
    }

    /// Resolve one beam contact. Damage is the rate over `hit_duration`;
    /// beams apply no impulse.
    pub fn resolve_beam<Q, D>(&mut self, shot: &BeamShot, query: &Q, directory: &mut D) -> HitOutcome
    where
        Q: SpatialQuery + ?Sized,
        D: EntityDirectory + ?Sized,
    {
        let multiplier = self.ammo.get_ammo_damage_multiplier(shot.ammo_type.index());
        let cast = Cast {
            ray: shot.ray,
            mask: shot.mask,
            source: shot.source,
            ammo_type: shot.ammo_type,
            kind: ShotKind::Beam,
            damage: shot.damage_per_second * shot.hit_duration.max(0.0) * multiplier,
            impulse: 0.0,
            filter: Filter::Any,
        };
        self.resolve(&cast, query, directory)
    }

    fn projectile_cast(&self, shot: &ProjectileShot, filter: Filter) -> Cast {
        let index = shot.ammo_type.index();
        Cast {
            ray: shot.ray,
            mask: shot.mask,
            source: shot.source,
            ammo_type: shot.ammo_type,
            kind: ShotKind::Projectile,
            damage: shot.base_damage * self.ammo.get_ammo_damage_multiplier(index),
            impulse: shot.base_impulse * self.ammo.get_ammo_impact_multiplier(index),
            filter,
        }
    }

    fn resolve<Q, D>(&mut self, cast: &Cast, query: &Q, directory: &mut D) -> HitOutcome
    where
        Q: SpatialQuery + ?Sized,
        D: EntityDirectory + ?Sized,
    {
        let Some(nearest) = query.raycast_nearest(&cast.ray, cast.mask) else {
            return HitOutcome::miss(&cast.ray);
        };

        // A solid first hit is classified on its own. If it turns out to be
        // ignorable (e.g. the caster's own collider) the full walk below
        // still runs.
        if !nearest.is_trigger {
            match evaluate(cast, &nearest, directory) {
                Step::Resolve(candidate) => return finish(cast, candidate, directory),
                Step::Block => return HitOutcome::miss(&cast.ray),
                Step::Skip => {}
            }
        }

        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        query.raycast_all(&cast.ray, cast.mask, MAX_HIT_CANDIDATES, &mut candidates);
        candidates.truncate(MAX_HIT_CANDIDATES);
        sort_by_distance(&mut candidates);

        let mut outcome = HitOutcome::miss(&cast.ray);
        for hit in &candidates {
            match evaluate(cast, hit, directory) {
                Step::Resolve(candidate) => {
                    outcome = finish(cast, candidate, directory);
                    break;
                }
                Step::Block => break,
                Step::Skip => {}
            }
        }

        self.candidates = candidates;
        outcome
    }
}

/// Stable ascending sort; NaN distances compare equal.
pub fn sort_by_distance(hits: &mut [Hit]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

enum Step {
    Resolve(HitCandidate),
    /// Stops the walk without a hit.
    Block,
    Skip,
}

fn evaluate<D: EntityDirectory + ?Sized>(cast: &Cast, hit: &Hit, directory: &D) -> Step {
    let kind = classify(cast, hit, directory);
    match (cast.filter, kind) {
        (_, HitKind::Ignored) => Step::Skip,
        (Filter::CharactersOnly, HitKind::Character { .. }) | (Filter::Any, _) => {
            Step::Resolve(HitCandidate {
                hit: *hit,
                kind,
                damage: cast.damage,
                impulse: cast.impulse,
            })
        }
        (Filter::CharactersOnly, _) if hit.is_trigger => Step::Skip,
        (Filter::CharactersOnly, _) => Step::Block,
    }
}

/// Character, then damage receiver, then dynamic body, then plain geometry.
fn classify<D: EntityDirectory + ?Sized>(cast: &Cast, hit: &Hit, directory: &D) -> HitKind {
    if let Some(target) = directory.character(hit) {
        let region = match target.region {
            Some(region) => region,
            // Root collider counts only when it is the single damage region.
            None if target.num_damage_regions <= 1 => DamageRegionId::MAIN,
            None => return HitKind::Ignored,
        };
        if cast.source.character == Some(target.id) {
            return HitKind::Ignored;
        }
        if !directory.is_collider_hittable(target.id, hit.collider) {
            return HitKind::Ignored;
        }
        return HitKind::Character {
            character: target.id,
            region,
        };
    }

    if let Some(receiver) = directory.damage_receiver(hit) {
        return HitKind::DamageReceiver(receiver);
    }

    if hit.is_trigger {
        return HitKind::Ignored;
    }

    if cast.kind == ShotKind::Projectile {
        if let Some(body) = directory.dynamic_body(hit) {
            return HitKind::DynamicBody(body);
        }
    }

    HitKind::PlainGeometry
}

fn finish<D: EntityDirectory + ?Sized>(cast: &Cast, candidate: HitCandidate, directory: &mut D) -> HitOutcome {
    let hit = &candidate.hit;
    let direction = cast.ray.direction;

    match candidate.kind {
        HitKind::Character { character, region } => {
            directory.apply_damage(character, region, candidate.damage, cast.ammo_type, hit.point);
            if candidate.impulse > 0.0 {
                directory.apply_impulse(character, direction, candidate.impulse, hit.point);
            }
            directory.on_hit(&HitEvent::Character(CharacterHitParameters {
                character,
                region,
                hit_point: hit.point,
                hit_normal: hit.normal,
                direction,
                damage: candidate.damage,
                impulse: candidate.impulse,
                ammo_type: cast.ammo_type,
                source: cast.source,
                kind: cast.kind,
            }));
        }
        HitKind::DamageReceiver(receiver) => {
            if cast.kind == ShotKind::Projectile && candidate.impulse > 0.0 {
                if let Some(body) = directory.dynamic_body(hit) {
                    directory.apply_impulse_at_point(body, direction * candidate.impulse, hit.point);
                }
            }
            directory.on_hit(&HitEvent::Object(ObjectHitParameters {
                receiver,
                collider: hit.collider,
                hit_point: hit.point,
                hit_normal: hit.normal,
                direction,
                damage: candidate.damage,
                impulse: candidate.impulse,
                ammo_type: cast.ammo_type,
                source: cast.source,
                kind: cast.kind,
            }));
        }
        HitKind::DynamicBody(body) => {
            if candidate.impulse > 0.0 {
                directory.apply_impulse_at_point(body, direction * candidate.impulse, hit.point);
            }
        }
        HitKind::PlainGeometry | HitKind::Ignored => {}
    }

    log::debug!(
        "{:?} hit {:?} at {:.2}m (damage {:.1}, impulse {:.1})",
        cast.kind,
        candidate.kind,
        hit.distance,
        candidate.damage,
        candidate.impulse
    );
    HitOutcome::hit(candidate)
}
