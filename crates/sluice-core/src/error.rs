//! Error types for sluice pipelines.

use thiserror::Error;

/// Main error type for pipeline construction and execution.
///
/// Exhaustion is not an error: end-of-sequence travels as
/// [`Pull::Done`](crate::Pull::Done) through the pull protocol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipeError {
    /// A source was refilled while it still held unconsumed data.
    #[error("{0} is not empty")]
    NotEmpty(String),

    /// A stage name is already registered and overwriting is not allowed.
    #[error("Pipe already has a stage named {0}")]
    NameTaken(String),

    /// A bypass was closed with a closer that does not belong to its opener.
    #[error("received {actual} but was expecting {expected} when closing a {open} bypass")]
    BypassMismatch {
        open: String,
        expected: String,
        actual: String,
    },

    /// A bypass closer was used on a pipe with no open bypass.
    #[error("{0} used on a pipe with no open bypass")]
    NoOpenBypass(String),

    /// Invalid stage or registry configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An add-in was unloaded without having been loaded.
    #[error("{0} has not been loaded")]
    NotLoaded(String),

    /// An add-in name is not present in the catalog.
    #[error("unknown add-in {0}")]
    UnknownAddIn(String),

    /// A stage name is not present in the registry.
    #[error("Pipe has no stage named {0}")]
    UnknownStage(String),

    /// A value had the right type but an unusable content.
    #[error("{0}")]
    Value(String),

    /// A value had the wrong type for an operation.
    #[error("{0}")]
    Type(String),

    /// A sequence index was out of range.
    #[error("{0}")]
    Index(String),

    /// A mapping key was missing.
    #[error("key not found: {0}")]
    Key(String),

    #[error("division by zero")]
    ZeroDivision,

    /// A stage demanded an element that its input never produced.
    #[error("{0}")]
    Exhausted(String),

    /// Error raised by caller supplied code.
    #[error("{0}")]
    Custom(String),
}

impl PipeError {
    /// Creates an error carrying a caller supplied message.
    pub fn custom(msg: impl Into<String>) -> Self {
        PipeError::Custom(msg.into())
    }

    /// Returns the classification tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipeError::NotEmpty(_) => ErrorKind::ReuseViolation,
            PipeError::NameTaken(_) => ErrorKind::Registration,
            PipeError::BypassMismatch { .. } | PipeError::NoOpenBypass(_) => {
                ErrorKind::BypassMismatch
            }
            PipeError::Config(_) => ErrorKind::Config,
            PipeError::NotLoaded(_) | PipeError::UnknownAddIn(_) | PipeError::UnknownStage(_) => {
                ErrorKind::NotFound
            }
            PipeError::Value(_) => ErrorKind::Value,
            PipeError::Type(_) => ErrorKind::Type,
            PipeError::Index(_) => ErrorKind::Index,
            PipeError::Key(_) => ErrorKind::Key,
            PipeError::ZeroDivision => ErrorKind::ZeroDivision,
            PipeError::Exhausted(_) => ErrorKind::Exhausted,
            PipeError::Custom(_) => ErrorKind::Custom,
        }
    }
}

/// Classification of a [`PipeError`].
///
/// Terminal stages name one kind at registration time; a terminal adapter
/// treats errors of that kind as "no input" rather than failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    ReuseViolation,
    Registration,
    BypassMismatch,
    Config,
    NotFound,
    Value,
    Type,
    Index,
    Key,
    ZeroDivision,
    Exhausted,
    Custom,
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipeError>;
