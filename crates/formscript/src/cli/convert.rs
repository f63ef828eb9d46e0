//! Convert command implementation
//!
//! Expressions are converted on blocking worker tasks that share one
//! read-only registry. Results come back in form order.

use super::output::{self, OutputFormat};
use crate::form::{convert_expression, ConvertedExpression, FormDescription, FormExpression};
use anyhow::{Context, Result};
use formscript_diagnostics::Severity;
use formscript_registry::FieldRegistry;
use formscript_transpiler::{TranspileOptions, Transpiler};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for convert command
pub struct ConvertConfig {
    pub form: PathBuf,
    pub options: TranspileOptions,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
    /// Fail when any expression produced a warning
    pub strict: bool,
    pub verbose: bool,
}

/// Convert all expressions of a form, `jobs` chunks at a time
pub async fn convert_parallel(
    registry: Arc<FieldRegistry>,
    options: Arc<TranspileOptions>,
    expressions: Vec<FormExpression>,
    jobs: usize,
) -> Result<Vec<ConvertedExpression>> {
    if expressions.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = expressions.len().div_ceil(jobs.max(1));

    let handles: Vec<_> = expressions
        .chunks(chunk_size)
        .map(|chunk| {
            let chunk = chunk.to_vec();
            let registry = Arc::clone(&registry);
            let options = Arc::clone(&options);
            tokio::task::spawn_blocking(move || {
                let transpiler = Transpiler::with_options(&registry, (*options).clone());
                chunk
                    .iter()
                    .map(|expression| convert_expression(&transpiler, expression))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut converted = Vec::with_capacity(expressions.len());
    for handle in handles {
        converted.extend(handle.await.context("Conversion task failed")?);
    }
    Ok(converted)
}

/// Render converted expressions in the requested format
pub fn render(converted: &[ConvertedExpression], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => converted
            .iter()
            .map(|c| c.output.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string(converted).context("Failed to serialize JSON")?,
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(converted).context("Failed to serialize JSON")?
        }
        OutputFormat::Tsv => {
            let mut rows = vec!["field\tkind\texpression".to_string()];
            rows.extend(converted.iter().map(|c| {
                format!(
                    "{}\t{}\t{}",
                    output::tsv_cell(&c.field),
                    c.kind,
                    output::tsv_cell(&c.output)
                )
            }));
            rows.join("\n")
        }
    })
}

/// Convert every expression of a form file
pub async fn convert(config: ConvertConfig) -> Result<()> {
    let form = FormDescription::from_json_file(&config.form)
        .with_context(|| format!("Failed to load form: {}", config.form.display()))?;
    let registry = form
        .registry()
        .with_context(|| format!("Invalid fields in {}", config.form.display()))?;
    tracing::info!(
        fields = registry.len(),
        expressions = form.expressions.len(),
        "loaded {}",
        config.form.display()
    );

    let jobs = std::thread::available_parallelism().map_or(1, |n| n.get());
    let converted = convert_parallel(
        Arc::new(registry),
        Arc::new(config.options),
        form.expressions,
        jobs,
    )
    .await?;

    let mut warnings = 0;
    for expression in &converted {
        let origin = format!("{}/{}", expression.field, expression.kind);
        for diagnostic in &expression.diagnostics {
            if diagnostic.severity != Severity::Info {
                warnings += 1;
            } else if !config.verbose {
                continue;
            }
            eprintln!("{}", output::format_diagnostic(&origin, diagnostic));
        }
    }

    output::write_output(&render(&converted, config.format)?, config.output_file.as_deref())?;

    if warnings > 0 {
        let message = format!("{} expressions converted with {warnings} warnings", converted.len());
        if config.strict {
            anyhow::bail!(message);
        }
        eprintln!("{}", output::format_warning(&message));
    } else if config.verbose {
        eprintln!(
            "{}",
            output::format_success(&format!("{} expressions converted", converted.len()))
        );
    }
    Ok(())
}
