//! Hit detection and damage resolution for projectiles and beams.
//!
//! The resolver never talks to a physics engine or scene directly. It asks a
//! [`SpatialQuery`] for ray hits, asks an [`EntityDirectory`] what each hit
//! collider belongs to, and reports damage, impulses and hit events back
//! through the directory. [`ImpactSpawner`] then places decals and effects
//! from the object pools.

pub mod ammo;
pub mod directory;
pub mod impact;
pub mod query;
pub mod resolver;

pub use ammo::*;
pub use directory::*;
pub use impact::*;
pub use query::*;
pub use resolver::*;
