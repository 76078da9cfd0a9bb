//! Error taxonomy for the simulation core.

use thiserror::Error;

use crate::{core::shape::ShapeKind, utils::allocator::BodyHandle};

/// Invalid body, behavior or world configuration, detected at setup time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),

    #[error("restitution must lie in [0, 1], got {0}")]
    InvalidRestitution(f32),

    #[error("friction coefficient must be non-negative, got {0}")]
    InvalidFriction(f32),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("{0} must be finite")]
    NonFinite(&'static str),

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("invalid world setting `{field}`: {reason}")]
    InvalidWorldSetting { field: &'static str, reason: String },

    #[error("no collision test exists for {0:?} against {1:?}")]
    UnsupportedShapePair(ShapeKind, ShapeKind),

    #[error("behavior `{behavior}` targets unknown body {handle}")]
    UnknownTarget {
        behavior: &'static str,
        handle: BodyHandle,
    },

    #[error("behavior `{behavior}` cannot act on immovable body {handle}")]
    ImmovableTarget {
        behavior: &'static str,
        handle: BodyHandle,
    },

    #[error("body {handle} (diameter {diameter}) does not fit inside the bounds of `{behavior}`")]
    BodyExceedsBounds {
        behavior: &'static str,
        handle: BodyHandle,
        diameter: f32,
    },
}

/// Local registry failures, recoverable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("body {0} not found")]
    NotFound(BodyHandle),

    #[error("body handle {0} is live or was already retired")]
    DuplicateHandle(BodyHandle),

    #[error("body handle {0} is reserved for unregistered bodies")]
    ReservedHandle(BodyHandle),

    #[error("no unused body handles left")]
    HandlesExhausted,
}

/// Top-level error returned by [`World`](crate::world::World) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("step timestamp must be finite, got {0}")]
    NonFiniteTime(f64),

    #[error("step timestamp {now} ms precedes the last step at {last} ms")]
    TimeWentBackwards { now: f64, last: f64 },

    #[error("body {0} reached a non-finite state; step discarded")]
    NonFiniteState(BodyHandle),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
