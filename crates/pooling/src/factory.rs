//! Host capability for creating and driving pooled instances.

use engine_core::Transform;

use crate::{InstanceHandle, PrototypeId};

/// Everything the registry needs from the host's scene graph.
pub trait PrototypeFactory {
    /// Create a new instance of `prototype`, or `None` if the host cannot.
    fn instantiate(&mut self, prototype: PrototypeId) -> Option<InstanceHandle>;

    fn set_active(&mut self, instance: InstanceHandle, active: bool);

    fn set_transform(&mut self, instance: InstanceHandle, transform: &Transform);

    /// Freeze an active instance (animation, particles, movement) in place.
    fn pause(&mut self, instance: InstanceHandle);

    fn resume(&mut self, instance: InstanceHandle);

    /// Release an instance when its registry is torn down.
    fn destroy(&mut self, _instance: InstanceHandle) {}
}
