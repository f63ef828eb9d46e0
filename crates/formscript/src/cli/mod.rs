//! CLI functionality for the formscript tool
//!
//! - Single expression conversion
//! - Whole-form conversion
//! - Output formatting

pub mod convert;
pub mod expr;
pub mod output;

use anyhow::{Context, Result};
use formscript_transpiler::{QuotePolicy, TranspileOptions};
use std::path::Path;

/// Load options from an optional config file, then apply command-line
/// overrides
pub fn load_options(
    config_file: Option<&Path>,
    quote_policy: Option<QuotePolicy>,
    current_field: Option<String>,
) -> Result<TranspileOptions> {
    let mut options = match config_file {
        Some(path) => TranspileOptions::from_json_file(path)
            .with_context(|| format!("Failed to load options: {}", path.display()))?,
        None => TranspileOptions::default(),
    };
    if let Some(policy) = quote_policy {
        options.quote_policy = policy;
    }
    if current_field.is_some() {
        options.current_field = current_field;
    }
    Ok(options)
}
