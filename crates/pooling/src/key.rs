//! Identity types: prototypes, host instances and pooled item keys.

use serde::{Deserialize, Serialize};

use crate::PoolCategory;

/// Template index (or slot index) meaning "not pooled".
pub const NO_PREFAB_ID: i32 = -1;

/// External identity of a prototype, e.g. the host's stable instance id.
/// Registering the same id twice yields the same template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrototypeId(pub i64);

/// Opaque host handle of one live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceHandle(pub u64);

/// Handle returned for every spawned item.
///
/// `sequence_number` is assigned fresh on every spawn, so a key kept past the
/// item's despawn no longer matches once the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PooledItemKey {
    pub category: PoolCategory,
    pub template_index: i32,
    pub slot_index: i32,
    pub sequence_number: u64,
}

impl PooledItemKey {
    pub const INVALID: PooledItemKey = PooledItemKey {
        category: PoolCategory::GenericObjects,
        template_index: NO_PREFAB_ID,
        slot_index: NO_PREFAB_ID,
        sequence_number: 0,
    };

    /// Whether the key was ever issued by a successful spawn. Says nothing
    /// about whether the item is still live; ask the registry for that.
    pub fn is_valid(&self) -> bool {
        self.template_index >= 0 && self.slot_index >= 0 && self.sequence_number != 0
    }

    pub(crate) fn indices(&self) -> Option<(usize, usize)> {
        if self.is_valid() {
            Some((self.template_index as usize, self.slot_index as usize))
        } else {
            None
        }
    }
}

impl Default for PooledItemKey {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Result of a successful spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedItem {
    pub instance: InstanceHandle,
    pub key: PooledItemKey,
}
