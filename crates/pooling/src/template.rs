//! Per-prototype pool storage.

use engine_core::Lifetime;
use serde::{Deserialize, Serialize};

use crate::{InstanceHandle, PrototypeId};

/// Pool configuration a prototype carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeSpec {
    pub prototype: Option<PrototypeId>,
    /// Instances created up front, all inactive.
    pub min_pool_size: usize,
    /// Hard cap; spawns beyond it fail.
    pub max_pool_size: usize,
    /// Seconds after spawning before the item despawns itself.
    pub despawn_after: Option<f32>,
}

impl Default for PrototypeSpec {
    fn default() -> Self {
        Self {
            prototype: None,
            min_pool_size: 10,
            max_pool_size: 100,
            despawn_after: None,
        }
    }
}

impl PrototypeSpec {
    pub fn new(prototype: PrototypeId, min_pool_size: usize, max_pool_size: usize) -> Self {
        Self {
            prototype: Some(prototype),
            min_pool_size,
            max_pool_size,
            despawn_after: None,
        }
    }

    pub fn with_despawn_after(mut self, seconds: f32) -> Self {
        self.despawn_after = Some(seconds);
        self
    }
}

/// One entry in a template's item list.
#[derive(Debug, Clone)]
pub struct PooledSlot {
    pub instance: InstanceHandle,
    pub active: bool,
    pub paused: bool,
    /// Sequence number of the current (or most recent) occupant.
    pub sequence_number: u64,
    pub lifetime: Option<Lifetime>,
}

impl PooledSlot {
    pub(crate) fn new(instance: InstanceHandle) -> Self {
        Self {
            instance,
            active: false,
            paused: false,
            sequence_number: 0,
            lifetime: None,
        }
    }
}

/// A prototype and its pool. Slots are only ever appended, so slot indices
/// stay valid for the template's whole life.
#[derive(Debug, Clone)]
pub struct PoolTemplate {
    identity: PrototypeId,
    min_capacity: usize,
    max_capacity: usize,
    despawn_after: Option<f32>,
    pub(crate) slots: Vec<PooledSlot>,
}

impl PoolTemplate {
    pub(crate) fn new(
        identity: PrototypeId,
        min_capacity: usize,
        max_capacity: usize,
        despawn_after: Option<f32>,
    ) -> Self {
        Self {
            identity,
            min_capacity,
            max_capacity,
            despawn_after,
            slots: Vec::with_capacity(min_capacity),
        }
    }

    pub fn identity(&self) -> PrototypeId {
        self.identity
    }

    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn despawn_after(&self) -> Option<f32> {
        self.despawn_after
    }

    pub fn current_size(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn slots(&self) -> &[PooledSlot] {
        &self.slots
    }

    /// First slot whose instance is free.
    pub(crate) fn first_inactive(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.active)
    }

    pub(crate) fn can_grow(&self) -> bool {
        self.slots.len() < self.max_capacity
    }
}
