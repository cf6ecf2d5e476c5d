//! Configuration errors raised when registering a prototype.

use thiserror::Error;

use crate::{PoolCategory, PrototypeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("{category:?} pool requested without a prototype")]
    MissingPrototype { category: PoolCategory },

    #[error("{category:?} prototype {prototype:?} has a maximum pool size of 0")]
    ZeroCapacity {
        category: PoolCategory,
        prototype: PrototypeId,
    },

    #[error("{category:?} prototype {prototype:?} has minimum pool size {min} above maximum {max}")]
    CapacityRange {
        category: PoolCategory,
        prototype: PrototypeId,
        min: usize,
        max: usize,
    },

    #[error("factory could not instantiate {category:?} prototype {prototype:?}")]
    InstantiateFailed {
        category: PoolCategory,
        prototype: PrototypeId,
    },
}
