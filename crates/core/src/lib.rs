//! Domain core for the travel journal client.
//!
//! Entry types, the backend transform layer, form validation and the
//! in-memory entry store. No I/O happens in this crate.

pub mod entry;
pub mod error;
pub mod photo;
pub mod store;
pub mod transform;
pub mod types;
pub mod validation;
