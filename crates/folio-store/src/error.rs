//! Store error types.

use std::path::PathBuf;

use folio_core::client::ClientError;
use folio_core::item::ItemError;

/// Errors that can occur while loading or querying a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g., "bundle", "worksheet").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Reading the store directory failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the store directory failed.
    #[error("failed to walk store directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A bundle or worksheet file is not valid JSON for its type.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stored worksheet item is malformed.
    #[error("worksheet {worksheet}: {source}")]
    Item {
        worksheet: String,
        #[source]
        source: ItemError,
    },

    /// The store's contents are inconsistent.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Convenience alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Creates a [`StoreError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a [`StoreError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ClientError::NotFound { entity, spec: id },
            other => ClientError::Unavailable(other.to_string()),
        }
    }
}
