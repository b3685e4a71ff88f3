//! Configuration management for the folio system.
//!
//! This crate discovers `.folio/` directories and loads
//! `.folio/config.yaml`, layered under `FOLIO_`-prefixed environment
//! variables.

pub mod config;
pub mod folio_dir;

pub use config::{ConfigError, FolioConfig, load_config};
pub use folio_dir::find_folio_dir;
