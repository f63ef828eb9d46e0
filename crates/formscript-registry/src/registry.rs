//! The per-form field registry
//!
//! A `FieldRegistry` is built once from a form's declared fields and is
//! read-only while expressions are converted. It is `Send + Sync`, so one
//! instance can be shared by parallel conversions.

use crate::path::{last_segment, normalize_declared_path};
use crate::sanitize::{
    sanitize_answer_code, sanitize_field_name, UniqueNames, MAX_ANSWER_CODE_LEN,
    MAX_FIELD_IDENTIFIER_LEN,
};
use formscript_diagnostics::{FormScriptError, Result, FSX0100, FSX0101, FSX0102, FSX0406};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A registered field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Declared path (`/data/group/name`) or bare name
    pub path: String,
    /// Field name, the last path segment
    pub name: String,
    /// Sanitized target identifier
    pub identifier: String,
    /// Choice value to answer code
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub choices: IndexMap<String, String>,
}

impl FieldEntry {
    /// Answer code for a choice value, if the field declares one
    pub fn answer_code(&self, value: &str) -> Option<&str> {
        self.choices.get(value).map(String::as_str)
    }
}

/// A field declaration as read from a form description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Declared path or bare name
    pub path: String,
    /// Explicit target identifier; derived from the name when absent
    #[serde(default)]
    pub identifier: Option<String>,
    /// Choice values; answer codes are derived from them
    #[serde(default)]
    pub choices: Vec<String>,
}

impl FieldDecl {
    /// Declaration with a derived identifier and no choices
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identifier: None,
            choices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameSlot {
    Unique(String),
    Ambiguous,
}

/// Mapping from logical field path to sanitized target identifier
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: IndexMap<String, FieldEntry>,
    by_name: HashMap<String, NameSlot>,
    identifiers: UniqueNames,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            by_name: HashMap::new(),
            identifiers: UniqueNames::new(MAX_FIELD_IDENTIFIER_LEN),
        }
    }
}

impl FieldRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declared paths, deriving identifiers
    pub fn from_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_decls(paths.into_iter().map(|p| FieldDecl::new(p.as_ref())))
    }

    /// Build a registry from field declarations.
    ///
    /// Explicit identifiers are reserved first so derived ones never take
    /// them. All registration errors are collected before returning.
    pub fn from_decls(decls: impl IntoIterator<Item = FieldDecl>) -> Result<Self> {
        let decls: Vec<FieldDecl> = decls.into_iter().collect();
        let mut registry = Self::new();
        for ident in decls.iter().filter_map(|d| d.identifier.as_deref()) {
            registry.identifiers.reserve(ident);
        }

        let mut errors = Vec::new();
        for decl in decls {
            let result = match decl.identifier {
                Some(ident) => registry.insert(&decl.path, ident),
                None => registry.register_derived(&decl.path).map(|_| ()),
            };
            let result = result.and_then(|()| registry.add_choices(&decl.path, &decl.choices));
            if let Err(err) = result {
                errors.push(err);
            }
        }

        match FormScriptError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(registry),
        }
    }

    /// Load declarations from a JSON array
    pub fn from_json(json: &str) -> Result<Self> {
        let decls: Vec<FieldDecl> = serde_json::from_str(json)
            .map_err(|e| FormScriptError::system(FSX0406, format!("Invalid field list: {e}")))?;
        Self::from_decls(decls)
    }

    /// Load declarations from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FormScriptError::from(e).with_context(path.display().to_string()))?;
        Self::from_json(&json)
    }

    /// Register a field with an explicit identifier
    pub fn register(&mut self, path: &str, identifier: impl Into<String>) -> Result<&FieldEntry> {
        let identifier = identifier.into();
        self.identifiers.reserve(&identifier);
        self.insert(path, identifier)?;
        self.get(path)
            .ok_or_else(|| FormScriptError::registry(FSX0102, "Field vanished after insert", path))
    }

    /// Register a field, deriving a unique identifier from its name
    pub fn register_derived(&mut self, path: &str) -> Result<&FieldEntry> {
        let normalized = normalize_declared_path(path);
        if normalized.is_empty() {
            return Err(FormScriptError::registry(FSX0100, "Empty field path", path));
        }
        if self.entries.contains_key(&normalized) {
            return Err(FormScriptError::registry(
                FSX0101,
                format!("Field '{normalized}' is declared more than once"),
                path,
            ));
        }
        let identifier = self
            .identifiers
            .allocate(&sanitize_field_name(last_segment(&normalized)));
        self.insert(path, identifier)?;
        self.get(path)
            .ok_or_else(|| FormScriptError::registry(FSX0102, "Field vanished after insert", path))
    }

    fn insert(&mut self, path: &str, identifier: String) -> Result<()> {
        let normalized = normalize_declared_path(path);
        if normalized.is_empty() {
            return Err(FormScriptError::registry(FSX0100, "Empty field path", path));
        }
        if self.entries.contains_key(&normalized) {
            return Err(FormScriptError::registry(
                FSX0101,
                format!("Field '{normalized}' is declared more than once"),
                path,
            ));
        }

        let name = last_segment(&normalized).to_string();
        self.by_name
            .entry(name.clone())
            .and_modify(|slot| *slot = NameSlot::Ambiguous)
            .or_insert_with(|| NameSlot::Unique(normalized.clone()));

        log::trace!("registered field {normalized} as {identifier}");
        self.entries.insert(
            normalized.clone(),
            FieldEntry {
                path: normalized,
                name,
                identifier,
                choices: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Add choice values to a field, deriving unique answer codes
    pub fn add_choices<S: AsRef<str>>(&mut self, path: &str, values: &[S]) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&normalize_declared_path(path))
            .ok_or_else(|| FormScriptError::registry(FSX0102, "Unknown field", path))?;

        let mut codes = UniqueNames::new(MAX_ANSWER_CODE_LEN);
        for code in entry.choices.values() {
            codes.reserve(code);
        }
        for value in values {
            let value = value.as_ref();
            if entry.choices.contains_key(value) {
                continue;
            }
            let code = codes.allocate(&sanitize_answer_code(value));
            entry.choices.insert(value.to_string(), code);
        }
        Ok(())
    }

    /// Map one choice value to an explicit answer code
    pub fn register_choice(&mut self, path: &str, value: &str, code: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&normalize_declared_path(path))
            .ok_or_else(|| FormScriptError::registry(FSX0102, "Unknown field", path))?;
        entry.choices.insert(value.to_string(), code.to_string());
        Ok(())
    }

    /// Look up by declared path (exact, case-sensitive)
    pub fn get(&self, path: &str) -> Option<&FieldEntry> {
        self.entries.get(&normalize_declared_path(path))
    }

    /// Look up by bare field name. Names declared under several paths
    /// are ambiguous and do not resolve.
    pub fn get_by_name(&self, name: &str) -> Option<&FieldEntry> {
        match self.by_name.get(name)? {
            NameSlot::Unique(path) => self.entries.get(path),
            NameSlot::Ambiguous => None,
        }
    }

    /// Look up a key that may be either a declared path or a bare name
    pub fn lookup(&self, key: &str) -> Option<&FieldEntry> {
        self.get(key).or_else(|| self.get_by_name(last_segment(key.trim())))
    }

    /// Whether a bare name is declared under more than one path
    pub fn is_ambiguous(&self, name: &str) -> bool {
        matches!(self.by_name.get(name), Some(NameSlot::Ambiguous))
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.values()
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fields are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_registry_is_shareable() {
        assert_send_sync::<FieldRegistry>();
    }

    #[test]
    fn test_from_paths_derives_identifiers() {
        let registry = FieldRegistry::from_paths(["/data/adult_consent", "/data/age"]).unwrap();
        assert_eq!(registry.lookup("adult_consent").unwrap().identifier, "adultconsent");
        assert_eq!(registry.lookup("/data/age").unwrap().identifier, "age");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let registry = FieldRegistry::from_paths(["/data/g1/first_name", "/data/g2/firstname"]).unwrap();
        let ids: Vec<_> = registry.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["firstname", "firstname1"]);
    }

    #[test]
    fn test_ambiguous_names_do_not_resolve_by_name() {
        let registry = FieldRegistry::from_paths(["/data/g1/q", "/data/g2/q"]).unwrap();
        assert!(registry.is_ambiguous("q"));
        assert!(registry.get_by_name("q").is_none());
        assert_eq!(registry.lookup("/data/g2/q").unwrap().identifier, "q1");
    }

    #[test]
    fn test_duplicate_and_empty_paths_are_errors() {
        let err = FieldRegistry::from_paths(["/data/a", "/data/a/", "  "]).unwrap_err();
        match err {
            FormScriptError::Multiple(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].code(), FSX0101);
                assert_eq!(errors[1].code(), FSX0100);
            }
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_identifiers_are_reserved() {
        let registry = FieldRegistry::from_decls([
            FieldDecl::new("/data/age"),
            FieldDecl {
                path: "/data/years".into(),
                identifier: Some("age".into()),
                choices: vec![],
            },
        ])
        .unwrap();
        assert_eq!(registry.lookup("years").unwrap().identifier, "age");
        assert_eq!(registry.lookup("age").unwrap().identifier, "age1");
    }

    #[test]
    fn test_choices_get_answer_codes() {
        let mut registry = FieldRegistry::from_paths(["/data/fruit"]).unwrap();
        registry
            .add_choices("/data/fruit", &["option_long", "option_longer", "yes"])
            .unwrap();
        registry.register_choice("/data/fruit", "maybe", "M").unwrap();

        let entry = registry.lookup("fruit").unwrap();
        assert_eq!(entry.answer_code("option_long"), Some("optio"));
        assert_eq!(entry.answer_code("option_longer"), Some("opti1"));
        assert_eq!(entry.answer_code("yes"), Some("yes"));
        assert_eq!(entry.answer_code("maybe"), Some("M"));
        assert_eq!(entry.answer_code("no"), None);
    }

    #[test]
    fn test_unknown_field_choice_is_error() {
        let mut registry = FieldRegistry::new();
        let err = registry.register_choice("nope", "a", "A").unwrap_err();
        assert_eq!(err.code(), FSX0102);
    }

    #[test]
    fn test_from_json() {
        let registry = FieldRegistry::from_json(
            r#"[{"path": "/data/consent", "choices": ["yes", "no"]}, {"path": "age", "identifier": "AGE"}]"#,
        )
        .unwrap();
        assert_eq!(registry.lookup("consent").unwrap().answer_code("no"), Some("no"));
        assert_eq!(registry.lookup("age").unwrap().identifier, "AGE");

        assert!(FieldRegistry::from_json("{").is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fields.json");
        std::fs::write(&file, r#"[{"path": "/data/q1"}]"#).unwrap();
        let registry = FieldRegistry::from_json_file(&file).unwrap();
        assert_eq!(registry.lookup("q1").unwrap().identifier, "q1");

        assert!(FieldRegistry::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
