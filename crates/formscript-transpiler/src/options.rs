//! Conversion options

use formscript_diagnostics::{FormScriptError, Result, FSX0402};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How string literals are quoted in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotePolicy {
    /// Only literals passing through `selected()` are re-quoted to double
    /// quotes; direct comparisons keep their source quoting
    #[default]
    SelectedOnly,
    /// Never re-quote
    Preserve,
    /// Re-quote every literal to double quotes
    Double,
}

impl fmt::Display for QuotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectedOnly => write!(f, "selected-only"),
            Self::Preserve => write!(f, "preserve"),
            Self::Double => write!(f, "double"),
        }
    }
}

impl FromStr for QuotePolicy {
    type Err = FormScriptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "selected-only" | "selected" => Ok(Self::SelectedOnly),
            "preserve" => Ok(Self::Preserve),
            "double" => Ok(Self::Double),
            other => Err(FormScriptError::config(
                FSX0402,
                format!("Unknown quote policy '{other}'. Use selected-only, preserve or double"),
            )),
        }
    }
}

/// Options controlling one transpiler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TranspileOptions {
    /// String literal quoting
    pub quote_policy: QuotePolicy,
    /// Path or name of the field owning the expressions; enables `.`,
    /// `current()` and relative path resolution
    pub current_field: Option<String>,
}

impl TranspileOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quote policy
    pub fn with_quote_policy(mut self, policy: QuotePolicy) -> Self {
        self.quote_policy = policy;
        self
    }

    /// Set the owning field
    pub fn with_current_field(mut self, field: impl Into<String>) -> Self {
        self.current_field = Some(field.into());
        self
    }

    /// Parse options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FormScriptError::config(FSX0402, format!("Invalid options: {e}")))
    }

    /// Load options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FormScriptError::from(e).with_context(path.display().to_string()))?;
        Self::from_json(&json).map_err(|e| e.with_context(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = TranspileOptions::from_json("{}").unwrap();
        assert_eq!(options, TranspileOptions::default());
        assert_eq!(options.quote_policy, QuotePolicy::SelectedOnly);
    }

    #[test]
    fn test_from_json() {
        let options =
            TranspileOptions::from_json(r#"{"quote-policy": "double", "current-field": "/data/age"}"#).unwrap();
        assert_eq!(options.quote_policy, QuotePolicy::Double);
        assert_eq!(options.current_field.as_deref(), Some("/data/age"));

        let err = TranspileOptions::from_json(r#"{"quote-policy": "single"}"#).unwrap_err();
        assert_eq!(err.code(), FSX0402);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("options.json");
        std::fs::write(&file, r#"{"quote-policy": "preserve"}"#).unwrap();
        assert_eq!(
            TranspileOptions::from_json_file(&file).unwrap().quote_policy,
            QuotePolicy::Preserve
        );
    }

    #[test]
    fn test_quote_policy_from_str() {
        assert_eq!("Double".parse::<QuotePolicy>().unwrap(), QuotePolicy::Double);
        assert_eq!(QuotePolicy::SelectedOnly.to_string(), "selected-only");
        assert!("single".parse::<QuotePolicy>().is_err());
    }
}
