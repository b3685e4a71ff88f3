//! Configuration types and loading for the folio system.
//!
//! [`FolioConfig`] is assembled from three layers, later ones winning:
//! built-in defaults, `.folio/config.yaml`, and `FOLIO_*` environment
//! variables (`FOLIO_MAX_LINES=200` sets `max-lines`).

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The config file inside the `.folio/` directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Prefix of environment variables that override the config file.
pub const ENV_PREFIX: &str = "FOLIO_";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The `.folio/` directory was not found.
    #[error("no .folio directory found (create one or pass --store)")]
    FolioDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The contents of `.folio/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FolioConfig {
    /// Store directory. Relative paths are taken from the `.folio/`
    /// directory; unset means the `.folio/` directory itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,

    /// Maximum number of lines read from a bundle file.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Maximum number of bundles a search block shows.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Worksheet used to resolve bundle names when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet: Option<String>,

    /// Log filter used when `--verbose` is not given.
    #[serde(default = "default_log")]
    pub log: String,
}

fn default_max_lines() -> usize {
    1000
}

fn default_search_limit() -> usize {
    100
}

fn default_log() -> String {
    "warn".to_string()
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            store: None,
            max_lines: default_max_lines(),
            search_limit: default_search_limit(),
            worksheet: None,
            log: default_log(),
        }
    }
}

impl FolioConfig {
    /// The store directory for a project whose `.folio/` directory is
    /// `folio_dir`.
    pub fn store_dir(&self, folio_dir: &Path) -> PathBuf {
        match &self.store {
            Some(store) if store.is_absolute() => store.clone(),
            Some(store) => folio_dir.join(store),
            None => folio_dir.to_path_buf(),
        }
    }

    fn validate(self) -> Result<Self> {
        if self.max_lines == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max-lines".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "search-limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(self)
    }
}

/// The layered configuration sources for `folio_dir`.
pub fn figment(folio_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(FolioConfig::default()))
        .merge(Yaml::file(folio_dir.join(CONFIG_FILE)))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .map(|key| key.as_str().to_ascii_lowercase().replace('_', "-").into()),
        )
}

/// Load configuration for the given `.folio/` directory.
///
/// A missing config file yields the defaults (still subject to environment
/// overrides).
pub fn load_config(folio_dir: &Path) -> Result<FolioConfig> {
    let config: FolioConfig = figment(folio_dir).extract().map_err(Box::new)?;
    config.validate()
}
