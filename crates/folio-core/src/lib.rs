//! Core types and traits for the folio worksheet system.
//!
//! This crate holds the worksheet item model, the token codec used for
//! directive values, bundle and worksheet descriptions, and the
//! [`client::BundleClient`] trait through which the interpreter reaches the
//! bundle store.

pub mod bundle;
pub mod client;
pub mod display;
pub mod item;
pub mod token;
pub mod worksheet;
