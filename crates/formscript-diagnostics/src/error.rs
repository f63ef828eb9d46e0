//! Diagnostic and error types

use crate::{ErrorCode, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the operation cannot proceed
    Error,
    /// Warning - output was produced but may be imperfect
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A non-fatal message produced while converting an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Byte span in the text the diagnostic was raised against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Additional context or help
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span: None,
            help: code.info().help.map(str::to_string),
        }
    }

    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    /// Create a new informational diagnostic
    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Info, code, message)
    }

    /// Set the span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

/// Main formscript error type
#[derive(Debug, Clone, Error)]
pub enum FormScriptError {
    /// Field registry construction or lookup error
    #[error("{code}: {message}")]
    Registry {
        code: ErrorCode,
        message: String,
        path: Option<String>,
    },

    /// Invalid configuration
    #[error("{code}: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// System error (I/O, serialization)
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<FormScriptError>),
}

impl FormScriptError {
    /// Create a registry error for a field path
    pub fn registry(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Registry {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a configuration error
    pub fn config(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to a config or system error
    pub fn with_context(self, ctx: impl Into<String>) -> Self {
        match self {
            Self::Config { code, message, .. } => Self::Config {
                code,
                message,
                context: Some(ctx.into()),
            },
            Self::System { code, message, .. } => Self::System {
                code,
                message,
                context: Some(ctx.into()),
            },
            other => other,
        }
    }

    /// Collapse a list of errors into one
    pub fn from_many(mut errors: Vec<FormScriptError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Registry { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::System { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Registry { code, message, path } => {
                let diag = Diagnostic::error(*code, message.clone());
                match path {
                    Some(path) => diag.with_help(format!("field path: {path}")),
                    None => diag,
                }
            }
            Self::Config { code, message, context } | Self::System { code, message, context } => {
                let diag = Diagnostic::error(*code, message.clone());
                match context {
                    Some(ctx) => diag.with_help(ctx.clone()),
                    None => diag,
                }
            }
            Self::Multiple(errors) => match errors.first() {
                Some(first) => first.to_diagnostic(),
                None => Diagnostic::error(ErrorCode::new(0), "Unknown error"),
            },
        }
    }
}

impl From<std::io::Error> for FormScriptError {
    fn from(err: std::io::Error) -> Self {
        Self::system(crate::FSX0401, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FSX0001, FSX0101, FSX0402};

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning(FSX0001, "Unresolved field reference '${x}'")
            .with_span(Span::new(0, 4));

        let text = diag.to_string();
        assert!(text.starts_with("warning: FSX0001"));
        assert!(text.ends_with("at 0..4"));
    }

    #[test]
    fn test_diagnostic_carries_default_help() {
        let diag = Diagnostic::warning(FSX0001, "x");
        assert!(diag.help.is_some());
    }

    #[test]
    fn test_error_code_and_context() {
        let err = FormScriptError::config(FSX0402, "bad quote policy").with_context("options.json");
        assert_eq!(err.code(), FSX0402);
        assert_eq!(err.to_diagnostic().help.as_deref(), Some("options.json"));
    }

    #[test]
    fn test_from_many() {
        assert!(FormScriptError::from_many(vec![]).is_none());

        let one = FormScriptError::registry(FSX0101, "dup", "/data/a");
        assert!(matches!(
            FormScriptError::from_many(vec![one.clone()]),
            Some(FormScriptError::Registry { .. })
        ));

        let many = FormScriptError::from_many(vec![one.clone(), one]).unwrap();
        assert_eq!(many.to_string(), "Multiple errors: 2");
        assert_eq!(many.code(), FSX0101);
    }
}
