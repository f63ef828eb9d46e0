//! Form descriptions
//!
//! A form description lists the declared fields (with their choice values)
//! and the relevance, constraint and calculation expressions attached to
//! them. It is the unit the `convert` command works on.

use formscript_diagnostics::{Diagnostic, FormScriptError, Result, FSX0406};
use formscript_registry::{FieldDecl, FieldRegistry};
use formscript_transpiler::{Conversion, TranspileOptions, Transpiler};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which form column an expression belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionKind {
    Relevance,
    Constraint,
    Calculation,
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relevance => write!(f, "relevance"),
            Self::Constraint => write!(f, "constraint"),
            Self::Calculation => write!(f, "calculation"),
        }
    }
}

/// One expression attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormExpression {
    /// Path or name of the owning field
    pub field: String,
    pub kind: ExpressionKind,
    /// Source expression
    pub expression: String,
}

/// Fields and expressions of one form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescription {
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub expressions: Vec<FormExpression>,
}

/// A converted expression, ready for the row emitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedExpression {
    pub field: String,
    pub kind: ExpressionKind,
    pub source: String,
    pub output: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ConvertedExpression {
    pub fn new(expression: &FormExpression, conversion: Conversion) -> Self {
        Self {
            field: expression.field.clone(),
            kind: expression.kind,
            source: expression.expression.clone(),
            output: conversion.output,
            diagnostics: conversion.diagnostics,
        }
    }
}

impl FormDescription {
    /// Parse a form description from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FormScriptError::system(FSX0406, format!("Invalid form description: {e}")))
    }

    /// Load a form description from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FormScriptError::from(e).with_context(path.display().to_string()))?;
        Self::from_json(&json).map_err(|e| e.with_context(path.display().to_string()))
    }

    /// Build the field registry for this form
    pub fn registry(&self) -> Result<FieldRegistry> {
        FieldRegistry::from_decls(self.fields.iter().cloned())
    }

    /// Convert every expression in order, each owned by its field
    pub fn convert(&self, registry: &FieldRegistry, options: &TranspileOptions) -> Vec<ConvertedExpression> {
        let transpiler = Transpiler::with_options(registry, options.clone());
        self.expressions
            .iter()
            .map(|expression| convert_expression(&transpiler, expression))
            .collect()
    }
}

/// Convert one form expression with its field as the owner
pub fn convert_expression(transpiler: &Transpiler<'_>, expression: &FormExpression) -> ConvertedExpression {
    let conversion = transpiler.transpile_for(&expression.expression, &expression.field);
    ConvertedExpression::new(expression, conversion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FORM: &str = r#"{
        "fields": [
            {"path": "/data/consent", "choices": ["yes", "no"]},
            {"path": "/data/age"},
            {"path": "/data/adult_consent", "identifier": "adultok"}
        ],
        "expressions": [
            {"field": "/data/age", "kind": "relevance", "expression": "selected(${consent}, 'yes')"},
            {"field": "/data/age", "kind": "constraint", "expression": ". >= 0 and . < 130"},
            {"field": "/data/adult_consent", "kind": "relevance", "expression": "../age >= 18"}
        ]
    }"#;

    #[test]
    fn test_convert_form() {
        let form = FormDescription::from_json(FORM).unwrap();
        let registry = form.registry().unwrap();
        let converted = form.convert(&registry, &TranspileOptions::default());

        let outputs: Vec<&str> = converted.iter().map(|c| c.output.as_str()).collect();
        assert_eq!(
            outputs,
            vec![r#"(consent == "yes")"#, "age >= 0  and  age < 130", "age >= 18"]
        );
        assert_eq!(converted[1].kind, ExpressionKind::Constraint);
        assert!(converted.iter().all(|c| c.diagnostics.is_empty()));
        assert_eq!(registry.get("/data/adult_consent").unwrap().identifier, "adultok");
    }

    #[test]
    fn test_invalid_form() {
        let err = FormDescription::from_json(r#"{"fields": 3}"#).unwrap_err();
        assert_eq!(err.code(), FSX0406);

        let err = FormDescription::from_json(r#"{"expressions": [{"field": "a", "kind": "hint", "expression": ""}]}"#)
            .unwrap_err();
        assert_eq!(err.code(), FSX0406);
    }

    #[test]
    fn test_empty_form() {
        let form = FormDescription::from_json("{}").unwrap();
        assert!(form.registry().unwrap().is_empty());
        assert!(form.convert(&FieldRegistry::new(), &TranspileOptions::default()).is_empty());
    }
}
