//! Interpretation error types.

use folio_core::client::ClientError;
use folio_core::token::TokenError;

/// Errors that abort an interpretation pass.
///
/// Per-line resolution failures never show up here: the classifier degrades
/// them to markup. Formatting failures never show up either: the
/// post-processing pipeline keeps the original value.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    /// A directive or command line could not be tokenized.
    #[error("parse error: {0}")]
    Parse(#[from] TokenError),

    /// The worksheet uses a directive, display mode or schema incorrectly.
    #[error("{0}")]
    Usage(String),

    /// The bundle store failed in a way that is not a per-line resolution
    /// failure.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Convenience alias used throughout the interpreter.
pub type Result<T> = std::result::Result<T, InterpretError>;

impl InterpretError {
    /// Creates an [`InterpretError::Usage`] with the given message.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Returns `true` if this is a [`InterpretError::Usage`].
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}
