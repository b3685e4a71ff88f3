//! Local bundle store for the folio system.
//!
//! Provides [`MemoryStore`], an implementation of
//! [`BundleClient`](folio_core::client::BundleClient) backed by a directory of
//! JSON files.

pub mod error;
pub mod memory;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, WorksheetRecord};
