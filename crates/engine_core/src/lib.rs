//! Core types shared by the pooling, combat and motion crates.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform / placement of pooled instances
//! - Fixed-step time management and the `Clock` capability
//! - Deterministic random sequence for tie-breaking and jitter
//! - Common components (health, lifetime)

pub mod components;
pub mod random;
pub mod time;
pub mod transform;

pub use components::*;
pub use random::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
