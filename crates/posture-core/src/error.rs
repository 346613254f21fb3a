use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dispatch-level operations.
pub type Result<T> = std::result::Result<T, PostureError>;

/// Failures surfaced at the dispatcher boundary.
///
/// The first four variants are expected, user-correctable conditions and are
/// reported with a specific message. `Handler` wraps anything raised while an
/// operation was producing its output.
#[derive(Error, Debug)]
pub enum PostureError {
    /// Input path does not exist
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Input exists but does not parse
    #[error("invalid format in {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// Input parses but is not a recognized or usable document
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Bad invocation (unknown operation, missing secondary input)
    #[error("usage: {message}")]
    Usage { message: String },

    /// Anything raised while an operation was running
    #[error("operation '{operation}' failed: {source:#}")]
    Handler {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PostureError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for faults raised inside a handler, as opposed to input problems.
    pub fn is_handler_fault(&self) -> bool {
        matches!(self, Self::Handler { .. })
    }
}
