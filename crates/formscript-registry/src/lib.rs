//! Field registry for form expression conversion
//!
//! This crate provides:
//! - `FieldRegistry`, the read-only mapping from authoring field paths to
//!   sanitized target identifiers, built once per form
//! - Field identifier and answer code sanitization
//! - Reference path parsing and normalization (`../name`, `current()/..`)

pub mod path;
pub mod registry;
pub mod sanitize;

pub use path::*;
pub use registry::*;
pub use sanitize::*;
