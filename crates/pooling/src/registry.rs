//! Registry of pool templates, one list per [`PoolCategory`].

use engine_core::{Lifetime, Transform};

use crate::{
    InstanceHandle, PoolCategory, PoolError, PoolTemplate, PooledItemKey, PooledSlot,
    PrototypeFactory, PrototypeId, PrototypeSpec, SpawnedItem,
};

/// Scene or session that owns a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SceneId(pub u32);

/// Owns every pool template for one scene.
pub struct PoolRegistry {
    scene: SceneId,
    templates: [Vec<PoolTemplate>; PoolCategory::COUNT],
    /// Last sequence number handed out. 0 is never issued.
    last_sequence: u64,
}

impl PoolRegistry {
    pub fn new(scene: SceneId) -> Self {
        Self {
            scene,
            templates: Default::default(),
            last_sequence: 0,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Look up the template for `prototype`, creating and pre-filling it on
    /// first use. Configuration problems are logged and returned; the registry
    /// is left unchanged.
    pub fn get_or_create_pool<F: PrototypeFactory + ?Sized>(
        &mut self,
        category: PoolCategory,
        spec: &PrototypeSpec,
        factory: &mut F,
    ) -> Result<usize, PoolError> {
        let result = self.try_get_or_create_pool(category, spec, factory);
        if let Err(e) = &result {
            log::warn!("Pool not created: {}", e);
        }
        result
    }

    fn try_get_or_create_pool<F: PrototypeFactory + ?Sized>(
        &mut self,
        category: PoolCategory,
        spec: &PrototypeSpec,
        factory: &mut F,
    ) -> Result<usize, PoolError> {
        let prototype = spec
            .prototype
            .ok_or(PoolError::MissingPrototype { category })?;

        if let Some(index) = self.find_template(category, prototype) {
            return Ok(index);
        }

        if spec.max_pool_size == 0 {
            return Err(PoolError::ZeroCapacity {
                category,
                prototype,
            });
        }
        if spec.min_pool_size > spec.max_pool_size {
            return Err(PoolError::CapacityRange {
                category,
                prototype,
                min: spec.min_pool_size,
                max: spec.max_pool_size,
            });
        }

        let mut template = PoolTemplate::new(
            prototype,
            spec.min_pool_size,
            spec.max_pool_size,
            spec.despawn_after,
        );

        for _ in 0..spec.min_pool_size {
            match factory.instantiate(prototype) {
                Some(instance) => {
                    factory.set_active(instance, false);
                    template.slots.push(PooledSlot::new(instance));
                }
                None => {
                    for slot in &template.slots {
                        factory.destroy(slot.instance);
                    }
                    return Err(PoolError::InstantiateFailed {
                        category,
                        prototype,
                    });
                }
            }
        }

        let list = &mut self.templates[category.index()];
        list.push(template);
        let index = list.len() - 1;
        log::info!(
            "Created {} pool {} for prototype {:?} ({}..={} instances)",
            category.name(),
            index,
            prototype,
            spec.min_pool_size,
            spec.max_pool_size
        );
        Ok(index)
    }

    /// Index of the template registered for `prototype`, if any.
    pub fn find_template(&self, category: PoolCategory, prototype: PrototypeId) -> Option<usize> {
        self.templates[category.index()]
            .iter()
            .position(|t| t.identity() == prototype)
    }

    pub fn template(&self, category: PoolCategory, index: usize) -> Option<&PoolTemplate> {
        self.templates[category.index()].get(index)
    }

    pub fn template_count(&self, category: PoolCategory) -> usize {
        self.templates[category.index()].len()
    }

    pub fn active_count(&self, category: PoolCategory, index: usize) -> usize {
        self.template(category, index)
            .map_or(0, PoolTemplate::active_count)
    }

    /// Activate a free instance of the template at `transform`.
    ///
    /// Grows the pool by one if every instance is busy and the maximum has not
    /// been reached. Returns `None` when the pool is full or the template does
    /// not exist.
    pub fn spawn<F: PrototypeFactory + ?Sized>(
        &mut self,
        category: PoolCategory,
        template_index: usize,
        transform: &Transform,
        factory: &mut F,
    ) -> Option<SpawnedItem> {
        let sequence_number = self.peek_next_sequence();
        let template = self.templates[category.index()].get_mut(template_index)?;

        let slot_index = match template.first_inactive() {
            Some(i) => i,
            None if template.can_grow() => {
                let instance = factory.instantiate(template.identity())?;
                template.slots.push(PooledSlot::new(instance));
                template.slots.len() - 1
            }
            None => {
                log::debug!(
                    "{} pool {} is at its maximum of {}; spawn skipped",
                    category.name(),
                    template_index,
                    template.max_capacity()
                );
                return None;
            }
        };

        let lifetime = template.despawn_after().map(Lifetime::new);
        let slot = &mut template.slots[slot_index];
        if slot.paused {
            factory.resume(slot.instance);
        }
        slot.active = true;
        slot.paused = false;
        slot.sequence_number = sequence_number;
        slot.lifetime = lifetime;
        let instance = slot.instance;

        factory.set_transform(instance, transform);
        factory.set_active(instance, true);
        self.last_sequence = sequence_number;

        Some(SpawnedItem {
            instance,
            key: PooledItemKey {
                category,
                template_index: template_index as i32,
                slot_index: slot_index as i32,
                sequence_number,
            },
        })
    }

    /// Return the item to its pool. Stale or invalid keys are ignored.
    pub fn despawn<F: PrototypeFactory + ?Sized>(
        &mut self,
        key: &PooledItemKey,
        factory: &mut F,
    ) -> bool {
        match self.live_slot_mut(key) {
            Some(slot) => {
                release(slot, factory);
                true
            }
            None => false,
        }
    }

    /// Reposition a live item. Stale or invalid keys are ignored.
    pub fn move_item<F: PrototypeFactory + ?Sized>(
        &mut self,
        key: &PooledItemKey,
        transform: &Transform,
        factory: &mut F,
    ) -> bool {
        match self.live_slot_mut(key) {
            Some(slot) => {
                factory.set_transform(slot.instance, transform);
                true
            }
            None => false,
        }
    }

    /// Whether `key` still refers to the current, active occupant of its slot.
    pub fn is_live(&self, key: &PooledItemKey) -> bool {
        self.live_slot(key).is_some()
    }

    pub fn instance(&self, key: &PooledItemKey) -> Option<InstanceHandle> {
        self.live_slot(key).map(|s| s.instance)
    }

    /// Pause every active instance in `category`.
    pub fn pause_all<F: PrototypeFactory + ?Sized>(&mut self, category: PoolCategory, factory: &mut F) {
        for template in &mut self.templates[category.index()] {
            for slot in template.slots.iter_mut().filter(|s| s.active && !s.paused) {
                slot.paused = true;
                factory.pause(slot.instance);
            }
        }
    }

    /// Resume every paused instance in `category`.
    pub fn resume_all<F: PrototypeFactory + ?Sized>(&mut self, category: PoolCategory, factory: &mut F) {
        for template in &mut self.templates[category.index()] {
            for slot in template.slots.iter_mut().filter(|s| s.active && s.paused) {
                slot.paused = false;
                factory.resume(slot.instance);
            }
        }
    }

    pub fn pause_everything<F: PrototypeFactory + ?Sized>(&mut self, factory: &mut F) {
        for category in PoolCategory::ALL {
            self.pause_all(category, factory);
        }
    }

    pub fn resume_everything<F: PrototypeFactory + ?Sized>(&mut self, factory: &mut F) {
        for category in PoolCategory::ALL {
            self.resume_all(category, factory);
        }
    }

    /// Count down timed items and despawn the expired ones. Paused items do
    /// not age. Returns how many items were despawned.
    pub fn tick<F: PrototypeFactory + ?Sized>(&mut self, dt: f32, factory: &mut F) -> usize {
        if !(dt > 0.0) {
            return 0;
        }
        let mut despawned = 0;
        for list in &mut self.templates {
            for template in list.iter_mut() {
                for slot in template.slots.iter_mut().filter(|s| s.active && !s.paused) {
                    let expired = slot.lifetime.as_mut().is_some_and(|l| l.update(dt));
                    if expired {
                        release(slot, factory);
                        despawned += 1;
                    }
                }
            }
        }
        despawned
    }

    /// Destroy every instance and forget all templates.
    pub fn clear<F: PrototypeFactory + ?Sized>(&mut self, factory: &mut F) {
        for list in &mut self.templates {
            for template in list.drain(..) {
                for slot in &template.slots {
                    factory.destroy(slot.instance);
                }
            }
        }
        log::debug!("Cleared pools for scene {:?}", self.scene);
    }

    fn peek_next_sequence(&self) -> u64 {
        match self.last_sequence.wrapping_add(1) {
            0 => 1,
            n => n,
        }
    }

    fn live_slot(&self, key: &PooledItemKey) -> Option<&PooledSlot> {
        let (t, s) = key.indices()?;
        let slot = self.templates[key.category.index()].get(t)?.slots.get(s)?;
        (slot.active && slot.sequence_number == key.sequence_number).then_some(slot)
    }

    fn live_slot_mut(&mut self, key: &PooledItemKey) -> Option<&mut PooledSlot> {
        let (t, s) = key.indices()?;
        let slot = self.templates[key.category.index()]
            .get_mut(t)?
            .slots
            .get_mut(s)?;
        (slot.active && slot.sequence_number == key.sequence_number).then_some(slot)
    }
}

/// Deactivate a slot's instance. A paused instance is resumed first so the
/// host never keeps a frozen instance in a free slot.
fn release<F: PrototypeFactory + ?Sized>(slot: &mut PooledSlot, factory: &mut F) {
    if slot.paused {
        factory.resume(slot.instance);
        slot.paused = false;
    }
    slot.active = false;
    slot.lifetime = None;
    factory.set_active(slot.instance, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{RandomSequence, Vec3};
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct MockFactory {
        next_id: u64,
        active: HashMap<InstanceHandle, bool>,
        paused: HashSet<InstanceHandle>,
        positions: HashMap<InstanceHandle, Vec3>,
        destroyed: Vec<InstanceHandle>,
        fail_after: Option<u64>,
    }

    impl PrototypeFactory for MockFactory {
        fn instantiate(&mut self, _prototype: PrototypeId) -> Option<InstanceHandle> {
            if self.fail_after.is_some_and(|n| self.next_id >= n) {
                return None;
            }
            self.next_id += 1;
            let handle = InstanceHandle(self.next_id);
            self.active.insert(handle, true);
            Some(handle)
        }

        fn set_active(&mut self, instance: InstanceHandle, active: bool) {
            self.active.insert(instance, active);
        }

        fn set_transform(&mut self, instance: InstanceHandle, transform: &Transform) {
            self.positions.insert(instance, transform.position);
        }

        fn pause(&mut self, instance: InstanceHandle) {
            self.paused.insert(instance);
        }

        fn resume(&mut self, instance: InstanceHandle) {
            self.paused.remove(&instance);
        }

        fn destroy(&mut self, instance: InstanceHandle) {
            self.destroyed.push(instance);
        }
    }

    fn registry_with(
        min: usize,
        max: usize,
    ) -> (PoolRegistry, MockFactory, usize) {
        let mut registry = PoolRegistry::new(SceneId(1));
        let mut factory = MockFactory::default();
        let index = registry
            .get_or_create_pool(
                PoolCategory::Effects,
                &PrototypeSpec::new(PrototypeId(42), min, max),
                &mut factory,
            )
            .unwrap();
        (registry, factory, index)
    }

    fn spawn(registry: &mut PoolRegistry, factory: &mut MockFactory, t: usize) -> Option<SpawnedItem> {
        registry.spawn(PoolCategory::Effects, t, &Transform::default(), factory)
    }

    #[test]
    fn prefills_min_capacity_inactive() {
        let (registry, factory, t) = registry_with(3, 5);
        let template = registry.template(PoolCategory::Effects, t).unwrap();
        assert_eq!(template.current_size(), 3);
        assert_eq!(template.active_count(), 0);
        assert!(factory.active.values().all(|a| !a));
    }

    #[test]
    fn same_prototype_reuses_template() {
        let (mut registry, mut factory, t) = registry_with(1, 2);
        let again = registry
            .get_or_create_pool(
                PoolCategory::Effects,
                &PrototypeSpec::new(PrototypeId(42), 1, 2),
                &mut factory,
            )
            .unwrap();
        assert_eq!(again, t);
        assert_eq!(registry.template_count(PoolCategory::Effects), 1);
        assert_eq!(factory.next_id, 1);

        let other = registry
            .get_or_create_pool(
                PoolCategory::Effects,
                &PrototypeSpec::new(PrototypeId(7), 0, 2),
                &mut factory,
            )
            .unwrap();
        assert_eq!(other, 1);
    }

    #[test]
    fn categories_are_independent() {
        let (mut registry, mut factory, _) = registry_with(1, 2);
        let decal = registry
            .get_or_create_pool(
                PoolCategory::Decals,
                &PrototypeSpec::new(PrototypeId(42), 1, 2),
                &mut factory,
            )
            .unwrap();
        assert_eq!(decal, 0);
        assert_eq!(registry.template_count(PoolCategory::Decals), 1);
        assert_eq!(registry.template_count(PoolCategory::Effects), 1);
    }

    #[test]
    fn configuration_errors_leave_registry_usable() {
        let mut registry = PoolRegistry::new(SceneId(0));
        let mut factory = MockFactory::default();
        let category = PoolCategory::Projectiles;

        let missing = PrototypeSpec::default();
        assert_eq!(
            registry.get_or_create_pool(category, &missing, &mut factory),
            Err(PoolError::MissingPrototype { category })
        );

        let zero = PrototypeSpec::new(PrototypeId(1), 0, 0);
        assert!(matches!(
            registry.get_or_create_pool(category, &zero, &mut factory),
            Err(PoolError::ZeroCapacity { .. })
        ));

        let inverted = PrototypeSpec::new(PrototypeId(1), 5, 2);
        assert!(matches!(
            registry.get_or_create_pool(category, &inverted, &mut factory),
            Err(PoolError::CapacityRange { min: 5, max: 2, .. })
        ));

        assert_eq!(registry.template_count(category), 0);
        let ok = registry.get_or_create_pool(category, &PrototypeSpec::new(PrototypeId(2), 1, 1), &mut factory);
        assert_eq!(ok, Ok(0));
    }

    #[test]
    fn failed_prefill_destroys_partial_instances() {
        let mut registry = PoolRegistry::new(SceneId(0));
        let mut factory = MockFactory {
            fail_after: Some(2),
            ..Default::default()
        };
        let result = registry.get_or_create_pool(
            PoolCategory::Effects,
            &PrototypeSpec::new(PrototypeId(3), 4, 4),
            &mut factory,
        );
        assert!(matches!(result, Err(PoolError::InstantiateFailed { .. })));
        assert_eq!(factory.destroyed.len(), 2);
        assert_eq!(registry.template_count(PoolCategory::Effects), 0);
    }

    #[test]
    fn end_to_end_two_slot_scenario() {
        let (mut registry, mut factory, t) = registry_with(2, 2);

        let first = spawn(&mut registry, &mut factory, t).unwrap();
        let second = spawn(&mut registry, &mut factory, t).unwrap();
        assert_ne!(first.key.slot_index, second.key.slot_index);
        assert!(spawn(&mut registry, &mut factory, t).is_none());

        assert!(registry.despawn(&first.key, &mut factory));
        let third = spawn(&mut registry, &mut factory, t).unwrap();
        assert_eq!(third.key.slot_index, 0);
        assert_eq!(third.instance, first.instance);
        assert!(third.key.sequence_number > first.key.sequence_number);
        assert!(!registry.is_live(&first.key));
        assert!(registry.is_live(&third.key));

        assert!(spawn(&mut registry, &mut factory, t).is_none());
    }

    #[test]
    fn grows_lazily_up_to_max() {
        let (mut registry, mut factory, t) = registry_with(0, 3);
        for expected in 1..=3 {
            assert!(spawn(&mut registry, &mut factory, t).is_some());
            assert_eq!(registry.template(PoolCategory::Effects, t).unwrap().current_size(), expected);
        }
        assert!(spawn(&mut registry, &mut factory, t).is_none());
        assert_eq!(registry.template(PoolCategory::Effects, t).unwrap().current_size(), 3);
    }

    #[test]
    fn stale_keys_are_ignored() {
        let (mut registry, mut factory, t) = registry_with(1, 1);
        let old = spawn(&mut registry, &mut factory, t).unwrap();
        registry.despawn(&old.key, &mut factory);
        let new = spawn(&mut registry, &mut factory, t).unwrap();

        let target = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(!registry.move_item(&old.key, &target, &mut factory));
        assert!(!registry.despawn(&old.key, &mut factory));
        assert!(registry.is_live(&new.key));
        assert_eq!(registry.instance(&old.key), None);

        assert!(registry.move_item(&new.key, &target, &mut factory));
        assert_eq!(factory.positions[&new.instance], target.position);
    }

    #[test]
    fn invalid_and_unknown_keys_are_ignored() {
        let (mut registry, mut factory, _) = registry_with(1, 1);
        assert!(!registry.despawn(&PooledItemKey::INVALID, &mut factory));
        let unknown = PooledItemKey {
            category: PoolCategory::Effects,
            template_index: 9,
            slot_index: 0,
            sequence_number: 1,
        };
        assert!(!registry.is_live(&unknown));
        assert!(spawn(&mut registry, &mut factory, 9).is_none());
    }

    #[test]
    fn identity_invariant_under_random_churn() {
        let (mut registry, mut factory, t) = registry_with(2, 4);
        let mut rng = RandomSequence::new(1234);
        let mut live: Vec<PooledItemKey> = Vec::new();
        let mut issued: Vec<PooledItemKey> = Vec::new();

        for _ in 0..500 {
            if live.is_empty() || rng.value() < 0.55 {
                if let Some(item) = spawn(&mut registry, &mut factory, t) {
                    for prev in issued.iter().filter(|k| k.slot_index == item.key.slot_index) {
                        assert!(item.key.sequence_number > prev.sequence_number);
                    }
                    live.push(item.key);
                    issued.push(item.key);
                } else {
                    assert_eq!(live.len(), 4);
                }
            } else {
                let i = rng.range_i32(0, live.len() as i32 - 1) as usize;
                let key = live.swap_remove(i);
                assert!(registry.despawn(&key, &mut factory));
                assert!(!registry.is_live(&key));
            }
            let template = registry.template(PoolCategory::Effects, t).unwrap();
            assert!(template.current_size() <= 4);
            assert_eq!(template.active_count(), live.len());
        }
    }

    #[test]
    fn pause_and_resume_only_touch_active_items() {
        let (mut registry, mut factory, t) = registry_with(3, 3);
        let a = spawn(&mut registry, &mut factory, t).unwrap();
        let b = spawn(&mut registry, &mut factory, t).unwrap();

        registry.pause_all(PoolCategory::Effects, &mut factory);
        assert_eq!(factory.paused.len(), 2);
        assert!(factory.paused.contains(&a.instance) && factory.paused.contains(&b.instance));

        registry.pause_all(PoolCategory::Decals, &mut factory);
        assert_eq!(factory.paused.len(), 2);

        registry.resume_everything(&mut factory);
        assert!(factory.paused.is_empty());
    }

    #[test]
    fn despawning_paused_item_resumes_it_in_host() {
        let (mut registry, mut factory, t) = registry_with(1, 1);
        let a = spawn(&mut registry, &mut factory, t).unwrap();
        registry.pause_all(PoolCategory::Effects, &mut factory);
        assert!(factory.paused.contains(&a.instance));

        assert!(registry.despawn(&a.key, &mut factory));
        assert!(!factory.paused.contains(&a.instance));

        let b = spawn(&mut registry, &mut factory, t).unwrap();
        assert_eq!(b.instance, a.instance);
        assert!(!factory.paused.contains(&b.instance));

        registry.pause_all(PoolCategory::Effects, &mut factory);
        registry.resume_all(PoolCategory::Effects, &mut factory);
        assert!(factory.paused.is_empty());
    }

    #[test]
    fn sequence_numbers_do_not_wrap_at_u32() {
        let (mut registry, mut factory, t) = registry_with(1, 1);
        registry.last_sequence = u32::MAX as u64;
        let item = spawn(&mut registry, &mut factory, t).unwrap();
        assert_eq!(item.key.sequence_number, u32::MAX as u64 + 1);
        assert!(registry.is_live(&item.key));
    }

    #[test]
    fn timed_items_despawn_unless_paused() {
        let mut registry = PoolRegistry::new(SceneId(0));
        let mut factory = MockFactory::default();
        let t = registry
            .get_or_create_pool(
                PoolCategory::Decals,
                &PrototypeSpec::new(PrototypeId(5), 1, 2).with_despawn_after(1.0),
                &mut factory,
            )
            .unwrap();
        let a = registry
            .spawn(PoolCategory::Decals, t, &Transform::default(), &mut factory)
            .unwrap();
        registry.pause_everything(&mut factory);
        assert_eq!(registry.tick(5.0, &mut factory), 0);
        assert!(registry.is_live(&a.key));

        registry.resume_everything(&mut factory);
        assert_eq!(registry.tick(0.5, &mut factory), 0);
        assert_eq!(registry.tick(0.5, &mut factory), 1);
        assert!(!registry.is_live(&a.key));
        assert!(!factory.active[&a.instance]);
    }

    #[test]
    fn clear_destroys_everything() {
        let (mut registry, mut factory, t) = registry_with(2, 3);
        spawn(&mut registry, &mut factory, t);
        spawn(&mut registry, &mut factory, t);
        spawn(&mut registry, &mut factory, t);
        registry.clear(&mut factory);
        assert_eq!(factory.destroyed.len(), 3);
        assert_eq!(registry.template_count(PoolCategory::Effects), 0);
    }
}
