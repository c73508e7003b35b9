//! Error taxonomy.
//!
//! The engine distinguishes construction-time configuration errors from the
//! single runtime failure mode: an invariant violation surfaced while debug
//! checks are enabled. Everything else degrades through the numeric clamp
//! chain and never leaves `advance_tick`.

use thiserror::Error;

use crate::invariants::ConsistencyViolation;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scale must be non-negative, got {0}")]
    NegativeScale(f64),
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be non-negative, got {value}")]
    NegativeQuantity { name: &'static str, value: f64 },
    #[error("ticks per month and months per year must be non-zero")]
    ZeroTimeUnit,
    #[error("{name} table must have {expected} entries, got {got}")]
    TableLength {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("resource {0:?} is not registered")]
    UnknownResource(String),
    #[error("resource {0:?} is already registered")]
    DuplicateResource(String),
    #[error("land-bound resource {0:?} cannot be given storage metrics")]
    LandBoundStorage(String),
    #[error("agent does not exist")]
    UnknownAgent,
    #[error("agent holds no assets on this planet")]
    MissingAssets,
    #[error("planet does not exist")]
    UnknownPlanet,
}

#[derive(Debug, Clone, Error)]
pub enum SimError {
    #[error(transparent)]
    Invariant(#[from] ConsistencyViolation),
}
