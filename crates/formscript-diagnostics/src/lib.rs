//! Diagnostics and error handling for formscript
//!
//! This crate provides the error handling infrastructure shared by the
//! registry, the transpiler and the CLI: structured error codes, source
//! spans, non-fatal conversion diagnostics and the fatal error type.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for formscript operations
pub type Result<T> = std::result::Result<T, FormScriptError>;
