//! Pool categories. Each keeps its own template list so that e.g. all effects
//! can be paused without touching projectiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolCategory {
    Beams,
    Decals,
    DynamicObjects,
    Effects,
    GenericObjects,
    Projectiles,
}

impl PoolCategory {
    pub const COUNT: usize = 6;

    pub const ALL: [PoolCategory; Self::COUNT] = [
        PoolCategory::Beams,
        PoolCategory::Decals,
        PoolCategory::DynamicObjects,
        PoolCategory::Effects,
        PoolCategory::GenericObjects,
        PoolCategory::Projectiles,
    ];

    pub fn index(self) -> usize {
        match self {
            PoolCategory::Beams => 0,
            PoolCategory::Decals => 1,
            PoolCategory::DynamicObjects => 2,
            PoolCategory::Effects => 3,
            PoolCategory::GenericObjects => 4,
            PoolCategory::Projectiles => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PoolCategory::Beams => "beam",
            PoolCategory::Decals => "decal",
            PoolCategory::DynamicObjects => "dynamic object",
            PoolCategory::Effects => "effect",
            PoolCategory::GenericObjects => "generic object",
            PoolCategory::Projectiles => "projectile",
        }
    }
}
