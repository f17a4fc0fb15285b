//! Error types for stowage.

use thiserror::Error;

/// Result type alias for stowage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building instances or manipulating packing state.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid geometry provided.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An argument was outside its accepted domain (corner id, orientation, index).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Mutation attempted on an entity that is already sealed.
    #[error("Already sealed: {0}")]
    AlreadySealed(String),

    /// Read attempted on an entity that has not been sealed yet.
    #[error("Not sealed: {0}")]
    NotSealed(String),

    /// The geometry oracle could not determine a volume.
    #[error("Volume unknown: {0}")]
    VolumeUnknown(String),

    /// The requested mode exists but is not supported.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A state precondition was violated (e.g. adding an already packed piece).
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Residual space was requested for a point without a tracked id.
    #[error("Unknown extreme point: {0}")]
    UnknownExtremePoint(String),

    /// A container already breaks a flag rule it should never break.
    #[error("Rule violation: {0}")]
    RuleViolation(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
