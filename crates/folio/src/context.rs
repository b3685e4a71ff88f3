//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs: the global
//! flags, the layered configuration and the resolved store directory.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use folio_config::{ConfigError, FolioConfig, find_folio_dir, load_config};
use folio_core::client::BundleClient;
use folio_store::MemoryStore;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Store directory, if one was given or discovered.
    pub store_dir: Option<PathBuf>,

    pub config: FolioConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    pub verbose: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// `--store` wins over the configured store. Configuration comes from
    /// the nearest `.folio/` directory; without one the defaults apply.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = env::current_dir().context("cannot determine the current directory")?;
        let folio_dir = find_folio_dir(&cwd);

        let config = match &folio_dir {
            Some(dir) => load_config(dir)
                .with_context(|| format!("failed to load config from {}", dir.display()))?,
            None => FolioConfig::default(),
        };

        let store_dir = global
            .store
            .clone()
            .or_else(|| folio_dir.as_deref().map(|dir| config.store_dir(dir)));

        Ok(Self {
            store_dir,
            config,
            json: global.json,
            verbose: global.verbose,
        })
    }

    /// Loads the bundle store.
    pub fn open_store(&self) -> Result<MemoryStore> {
        let dir = self.store_dir.as_ref().ok_or(ConfigError::FolioDirNotFound)?;
        MemoryStore::load_dir(dir).with_context(|| format!("failed to load store {}", dir.display()))
    }

    /// The worksheet bundle names are resolved against: `spec` if given,
    /// else the configured worksheet, else none (an empty uuid).
    pub fn context_worksheet(&self, store: &MemoryStore, spec: Option<&str>) -> Result<String> {
        match spec.or(self.config.worksheet.as_deref()) {
            Some(spec) => Ok(store.resolve_worksheet_uuid("", spec)?),
            None => Ok(String::new()),
        }
    }
}
