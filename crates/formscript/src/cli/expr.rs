//! Expr command implementation

use super::output::{self, OutputFormat};
use crate::form::FormDescription;
use anyhow::{Context, Result};
use formscript_registry::FieldRegistry;
use formscript_transpiler::{Conversion, TranspileOptions, Transpiler};
use std::path::PathBuf;

/// Configuration for expr command
pub struct ExprConfig {
    pub expression: String,
    /// `PATH` or `PATH=IDENTIFIER`
    pub fields: Vec<String>,
    pub form: Option<PathBuf>,
    pub options: TranspileOptions,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Build the registry from the form file and `--field` declarations
pub fn build_registry(form: Option<&PathBuf>, fields: &[String]) -> Result<FieldRegistry> {
    let mut registry = match form {
        Some(path) => FormDescription::from_json_file(path)
            .and_then(|form| form.registry())
            .with_context(|| format!("Failed to load form: {}", path.display()))?,
        None => FieldRegistry::new(),
    };

    for field in fields {
        let registered = match field.split_once('=') {
            Some((path, identifier)) => registry.register(path.trim(), identifier.trim()),
            None => registry.register_derived(field.trim()),
        };
        registered.with_context(|| format!("Invalid field declaration: {field}"))?;
    }
    Ok(registry)
}

/// Render one conversion in the requested format
pub fn render(conversion: &Conversion, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => conversion.output.clone(),
        OutputFormat::Tsv => output::tsv_cell(&conversion.output),
        OutputFormat::Json => serde_json::to_string(conversion).context("Failed to serialize JSON")?,
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(conversion).context("Failed to serialize JSON")?
        }
    })
}

/// Convert a single expression
pub async fn expr(config: ExprConfig) -> Result<()> {
    let registry = build_registry(config.form.as_ref(), &config.fields)?;
    tracing::debug!(fields = registry.len(), "registry ready");

    let conversion = Transpiler::with_options(&registry, config.options).transpile_with_diagnostics(&config.expression);
    for diagnostic in &conversion.diagnostics {
        eprintln!("{}", output::format_diagnostic("expression", diagnostic));
    }

    output::write_output(&render(&conversion, config.format)?, config.output_file.as_deref())
}
