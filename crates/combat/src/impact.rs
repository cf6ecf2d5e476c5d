//! Decals and hit effects spawned from the object pools.

use std::f32::consts::TAU;

use engine_core::{RandomSequence, Transform};
use pooling::{PoolCategory, PoolRegistry, PooledItemKey, PrototypeFactory};
use serde::{Deserialize, Serialize};

use crate::{HitCandidate, HitKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactSettings {
    /// Distance decals are lifted off the surface along the normal.
    pub decal_offset: f32,
    /// Upper bound of the random decal spin, radians.
    pub max_decal_spin: f32,
}

impl Default for ImpactSettings {
    fn default() -> Self {
        Self {
            decal_offset: 0.005,
            max_decal_spin: TAU,
        }
    }
}

/// Keys of whatever was spawned for one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImpactSpawns {
    pub decal: Option<PooledItemKey>,
    pub effect: Option<PooledItemKey>,
}

/// Picks and places decal and effect prefabs for resolved hits.
///
/// Template indices refer to the registry's `Decals` and `Effects`
/// categories.
#[derive(Debug, Clone, Default)]
pub struct ImpactSpawner {
    settings: ImpactSettings,
    decal_templates: Vec<usize>,
    effect_template: Option<usize>,
    character_effect_template: Option<usize>,
}

impl ImpactSpawner {
    pub fn new(settings: ImpactSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn with_decals(mut self, templates: Vec<usize>) -> Self {
        self.decal_templates = templates;
        self
    }

    pub fn with_effect(mut self, template: usize) -> Self {
        self.effect_template = Some(template);
        self
    }

    /// Effect used for character hits instead of the default one.
    pub fn with_character_effect(mut self, template: usize) -> Self {
        self.character_effect_template = Some(template);
        self
    }

    pub fn spawn_for<F: PrototypeFactory + ?Sized>(
        &self,
        candidate: &HitCandidate,
        registry: &mut PoolRegistry,
        factory: &mut F,
        rng: &mut RandomSequence,
    ) -> ImpactSpawns {
        let hit = &candidate.hit;
        let is_character = match candidate.kind {
            HitKind::Ignored => return ImpactSpawns::default(),
            HitKind::Character { .. } => true,
            _ => false,
        };

        let mut spawns = ImpactSpawns::default();

        if !is_character {
            if let Some(template) = self.pick_decal(rng) {
                let spin = rng.range_f32(0.0, self.settings.max_decal_spin);
                let position = hit.point + hit.normal * self.settings.decal_offset;
                let placement = Transform::facing(position, hit.normal, spin);
                spawns.decal = registry
                    .spawn(PoolCategory::Decals, template, &placement, factory)
                    .map(|item| item.key);
            }
        }

        let effect = if is_character {
            self.character_effect_template.or(self.effect_template)
        } else {
            self.effect_template
        };
        if let Some(template) = effect {
            let placement = Transform::facing(hit.point, hit.normal, 0.0);
            spawns.effect = registry
                .spawn(PoolCategory::Effects, template, &placement, factory)
                .map(|item| item.key);
        }

        spawns
    }

    fn pick_decal(&self, rng: &mut RandomSequence) -> Option<usize> {
        match self.decal_templates.len() {
            0 => None,
            1 => Some(self.decal_templates[0]),
            n => {
                let i = rng.range_i32(0, n as i32 - 1) as usize;
                self.decal_templates.get(i).copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::Vec3;
    use pooling::{InstanceHandle, PrototypeId, PrototypeSpec, SceneId};

    use super::*;
    use crate::{CharacterId, ColliderId, DamageRegionId, Hit};

    #[derive(Default)]
    struct MockFactory {
        next: u64,
        placements: HashMap<InstanceHandle, Transform>,
    }

    impl PrototypeFactory for MockFactory {
        fn instantiate(&mut self, _prototype: PrototypeId) -> Option<InstanceHandle> {
            self.next += 1;
            Some(InstanceHandle(self.next))
        }

        fn set_active(&mut self, _instance: InstanceHandle, _active: bool) {}

        fn set_transform(&mut self, instance: InstanceHandle, transform: &Transform) {
            self.placements.insert(instance, *transform);
        }

        fn pause(&mut self, _instance: InstanceHandle) {}

        fn resume(&mut self, _instance: InstanceHandle) {}
    }

    fn candidate(kind: HitKind) -> HitCandidate {
        HitCandidate {
            hit: Hit {
                point: Vec3::new(1.0, 2.0, 3.0),
                normal: Vec3::Y,
                distance: 4.0,
                collider: ColliderId(1),
                body: None,
                is_trigger: false,
            },
            kind,
            damage: 1.0,
            impulse: 0.0,
        }
    }

    fn setup() -> (PoolRegistry, MockFactory, ImpactSpawner) {
        let mut registry = PoolRegistry::new(SceneId(0));
        let mut factory = MockFactory::default();
        let d0 = registry
            .get_or_create_pool(PoolCategory::Decals, &PrototypeSpec::new(PrototypeId(1), 1, 4), &mut factory)
            .unwrap();
        let d1 = registry
            .get_or_create_pool(PoolCategory::Decals, &PrototypeSpec::new(PrototypeId(2), 1, 4), &mut factory)
            .unwrap();
        let fx = registry
            .get_or_create_pool(PoolCategory::Effects, &PrototypeSpec::new(PrototypeId(3), 1, 4), &mut factory)
            .unwrap();
        let spawner = ImpactSpawner::new(ImpactSettings::default())
            .with_decals(vec![d0, d1])
            .with_effect(fx);
        (registry, factory, spawner)
    }

    #[test]
    fn geometry_gets_decal_and_effect() {
        let (mut registry, mut factory, spawner) = setup();
        let mut rng = RandomSequence::new(7);

        let spawns = spawner.spawn_for(&candidate(HitKind::PlainGeometry), &mut registry, &mut factory, &mut rng);
        let decal = spawns.decal.unwrap();
        assert!(registry.is_live(&decal));
        assert!(registry.is_live(&spawns.effect.unwrap()));

        let placement = factory.placements[&registry.instance(&decal).unwrap()];
        assert!((placement.position - Vec3::new(1.0, 2.005, 3.0)).length() < 1e-5);
        // Decal faces out of the surface.
        assert!((placement.forward() - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn characters_get_no_decal() {
        let (mut registry, mut factory, spawner) = setup();
        let mut rng = RandomSequence::new(7);
        let kind = HitKind::Character {
            character: CharacterId(1),
            region: DamageRegionId::MAIN,
        };

        let spawns = spawner.spawn_for(&candidate(kind), &mut registry, &mut factory, &mut rng);
        assert!(spawns.decal.is_none());
        assert!(spawns.effect.is_some());
    }

    #[test]
    fn character_effect_overrides_default() {
        let (mut registry, mut factory, spawner) = setup();
        let blood = registry
            .get_or_create_pool(PoolCategory::Effects, &PrototypeSpec::new(PrototypeId(4), 1, 4), &mut factory)
            .unwrap();
        let spawner = spawner.with_character_effect(blood);
        let mut rng = RandomSequence::new(7);
        let kind = HitKind::Character {
            character: CharacterId(1),
            region: DamageRegionId::MAIN,
        };

        let on_character = spawner.spawn_for(&candidate(kind), &mut registry, &mut factory, &mut rng);
        assert_eq!(on_character.effect.unwrap().template_index, blood as i32);

        let on_wall = spawner.spawn_for(&candidate(HitKind::PlainGeometry), &mut registry, &mut factory, &mut rng);
        assert_ne!(on_wall.effect.unwrap().template_index, blood as i32);
    }

    #[test]
    fn ignored_spawns_nothing() {
        let (mut registry, mut factory, spawner) = setup();
        let mut rng = RandomSequence::new(7);
        let spawns = spawner.spawn_for(&candidate(HitKind::Ignored), &mut registry, &mut factory, &mut rng);
        assert_eq!(spawns, ImpactSpawns::default());
    }

    #[test]
    fn decal_choice_is_deterministic_per_seed() {
        let pick = |seed| {
            let (mut registry, mut factory, spawner) = setup();
            let mut rng = RandomSequence::new(seed);
            (0..6)
                .map(|_| {
                    spawner
                        .spawn_for(&candidate(HitKind::PlainGeometry), &mut registry, &mut factory, &mut rng)
                        .decal
                        .map(|k| k.template_index)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(42), pick(42));
    }
}
