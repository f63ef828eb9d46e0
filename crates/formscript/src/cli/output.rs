//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use formscript_diagnostics::{Diagnostic, Severity};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Converted text only, one line per expression
    #[default]
    Text,
    Json,
    JsonPretty,
    /// Tab-separated rows for the survey import sheet
    Tsv,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "pretty" | "json-pretty" => Ok(Self::JsonPretty),
            "tsv" => Ok(Self::Tsv),
            other => anyhow::bail!("Unsupported output format: {other}. Use text, json, pretty or tsv"),
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(io::stderr().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Format a conversion diagnostic, prefixed with what it belongs to
pub fn format_diagnostic(origin: &str, diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    };
    let mut line = format!(
        "{}: {} [{}] {}",
        origin.cyan(),
        label,
        diagnostic.code,
        diagnostic.message
    );
    if let Some(help) = &diagnostic.help {
        line.push_str(&format!("\n  {} {}", "help:".bold(), help));
    }
    line
}

/// Make a value safe for one TSV cell
pub fn tsv_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{content}").context("Failed to write to stdout")?;
    }
    Ok(())
}
