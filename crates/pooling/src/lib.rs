//! Object pools for spawned scene objects (beams, decals, effects, projectiles…).
//!
//! A [`PoolRegistry`] keeps one template per prototype and hands out
//! [`PooledItemKey`]s whose sequence number tells a stale handle apart from
//! the slot's current occupant. Instances themselves live in the host; the
//! registry only drives them through a [`PrototypeFactory`].
//!
//! The registry is plain single-threaded state. Share it across threads only
//! behind a single lock around `spawn`/`despawn`.

pub mod category;
pub mod error;
pub mod factory;
pub mod key;
pub mod registry;
pub mod template;

pub use category::*;
pub use error::*;
pub use factory::*;
pub use key::*;
pub use registry::*;
pub use template::*;
