//! Worksheet interpretation engine for the folio system.
//!
//! Turns worksheet source lines into typed items ([`form`]), then walks the
//! items ([`engine`]) grouping consecutive bundle references into tables,
//! records and references according to the active display mode and schema
//! ([`schema`]). Values are pulled out of bundles through generalized paths
//! ([`genpath`]) and cleaned up by a post-processing pipeline
//! ([`postprocess`]). File-backed values stay deferred until
//! [`materialize`] fetches them; saved searches are replayed by [`search`].

pub mod engine;
pub mod error;
pub mod format;
pub mod form;
pub mod genpath;
pub mod materialize;
pub mod postprocess;
pub mod render;
pub mod schema;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::interpret_items;
pub use error::{InterpretError, Result};
pub use form::{ParsedForm, hydrate_items, parse_worksheet_form, worksheet_lines};
pub use genpath::TargetCache;
pub use materialize::materialize;
pub use render::{CellValue, DeferredValue, InterpretResult, RecordRow, RenderedItem, SearchBlock};
pub use schema::{Schema, SchemaItem, SchemaRegistry};
pub use search::{SEARCH_LIMIT, expand_searches, interpret_search};
