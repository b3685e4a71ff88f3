//! The [`BundleClient`] trait -- everything the worksheet layer needs from
//! the bundle store.
//!
//! Interpretation code depends on this trait rather than on a concrete store
//! so that remote clients, local stores and test fakes can be substituted.
//! All calls are synchronous; retries and timeouts are the implementor's
//! business.

use serde::{Deserialize, Serialize};

use crate::bundle::BundleInfo;
use crate::worksheet::WorksheetInfo;

/// A file inside a bundle's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub bundle_uuid: String,
    /// Path relative to the bundle root, without a leading `/`.
    pub subpath: String,
}

impl Target {
    pub fn new(bundle_uuid: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self {
            bundle_uuid: bundle_uuid.into(),
            subpath: subpath.into(),
        }
    }
}

/// Returns whether `spec` is already a UUID (`0x` followed by 32 lowercase
/// hex digits), so that it needs no resolution.
pub fn is_uuid(spec: &str) -> bool {
    spec.strip_prefix("0x").is_some_and(|hex| {
        hex.len() == 32 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// Errors reported by a [`BundleClient`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Nothing matched the given spec.
    #[error("{entity} not found: {spec}")]
    NotFound { entity: String, spec: String },

    /// More than one thing matched the given spec.
    #[error("{spec} matches {count} {entity}s")]
    Ambiguous {
        entity: String,
        spec: String,
        count: usize,
    },

    /// The spec is syntactically invalid.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// The store could not be reached or read.
    #[error("client unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn not_found(entity: impl Into<String>, spec: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            spec: spec.into(),
        }
    }

    /// Returns `true` if the error means "this spec does not name anything",
    /// as opposed to a failure of the store itself.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Ambiguous { .. } | Self::InvalidSpec(_)
        )
    }
}

/// Read access to bundles and worksheets.
pub trait BundleClient {
    /// Resolves a human-readable bundle spec relative to a worksheet.
    fn resolve_bundle_uuid(&self, worksheet_uuid: &str, bundle_spec: &str) -> Result<String>;

    /// Resolves a human-readable worksheet spec relative to another worksheet.
    fn resolve_worksheet_uuid(
        &self,
        base_worksheet_uuid: &str,
        worksheet_spec: &str,
    ) -> Result<String>;

    /// Fetches the full description of a bundle.
    fn get_bundle_info(&self, uuid: &str) -> Result<BundleInfo>;

    /// Fetches a worksheet with its items (bundle items carry only UUIDs).
    fn get_worksheet_info(&self, uuid: &str) -> Result<WorksheetInfo>;

    /// Reads up to `max_lines` lines of a file inside a bundle.
    ///
    /// Returns `Ok(None)` if the target does not exist or is not a file.
    fn head_target(&self, target: &Target, max_lines: usize) -> Result<Option<Vec<String>>>;

    /// Returns the UUIDs of bundles matching `keywords`, at most `limit`.
    fn search_bundle_uuids(
        &self,
        worksheet_uuid: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<String>>;
}
