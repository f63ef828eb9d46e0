//! Field reference resolution
//!
//! Maps reference tokens (`${name}`, `/data/grp/name`, `../name`,
//! `current()/../name`, `.`) to registry identifiers. Resolution is
//! advisory: a reference the registry does not know is emitted with its
//! delimiters stripped.

use crate::scanner::{at_token_boundary, is_name_byte, is_name_start, is_word_byte, literal_end};
use formscript_diagnostics::{Diagnostic, FSX0001};
use formscript_registry::{last_segment, normalize_declared_path, FieldEntry, FieldPath, FieldRegistry, CURRENT_FN};

/// Outcome of resolving one reference token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'r> {
    /// The registry knows the field
    Resolved(&'r FieldEntry),
    /// Best-effort fallback text (delimiters stripped)
    Unresolved(String),
}

impl Resolution<'_> {
    /// Text to emit for this reference
    pub fn into_text(self) -> String {
        match self {
            Self::Resolved(entry) => entry.identifier.clone(),
            Self::Unresolved(text) => text,
        }
    }

    /// Whether the registry knew the field
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Read-only view of a registry that resolves reference tokens
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'r> {
    registry: &'r FieldRegistry,
}

impl<'r> FieldResolver<'r> {
    /// Create a resolver over a registry
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry
    pub fn registry(&self) -> &'r FieldRegistry {
        self.registry
    }

    /// Absolute path of the field owning the expression, used as the
    /// context node for relative paths
    pub fn owner_path(&self, owner: Option<&str>) -> Option<String> {
        let owner = owner?;
        match self.registry.lookup(owner) {
            Some(entry) if entry.path.starts_with('/') => Some(entry.path.clone()),
            _ if owner.trim().starts_with('/') => Some(normalize_declared_path(owner)),
            _ => None,
        }
    }

    /// Resolve a reference token.
    ///
    /// `${name}` looks the name up directly. Paths are evaluated against
    /// the owning field when one is known and looked up by absolute path,
    /// then by their final name, so relative and absolute references to
    /// the same field resolve identically.
    pub fn resolve(&self, token: &str, owner: Option<&str>) -> Resolution<'r> {
        let token = token.trim();

        if let Some(name) = brace_name(token) {
            return match self.registry.lookup(name) {
                Some(entry) => Resolution::Resolved(entry),
                None => Resolution::Unresolved(name.to_string()),
            };
        }

        let path = FieldPath::parse(token);
        if path.is_self() {
            return match owner {
                Some(owner) => match self.registry.lookup(owner) {
                    Some(entry) => Resolution::Resolved(entry),
                    None => Resolution::Unresolved(last_segment(owner.trim()).to_string()),
                },
                None => Resolution::Unresolved(token.to_string()),
            };
        }

        let context = self.owner_path(owner);
        if let Some(absolute) = path.resolve(context.as_deref()) {
            if let Some(entry) = self.registry.get(&absolute) {
                return Resolution::Resolved(entry);
            }
        }

        match path.name() {
            Some(name) => match self.registry.get_by_name(name) {
                Some(entry) => Resolution::Resolved(entry),
                None => Resolution::Unresolved(name.to_string()),
            },
            None => Resolution::Unresolved(token.to_string()),
        }
    }

    /// The registry entry a token refers to, if any
    pub fn entry(&self, token: &str, owner: Option<&str>) -> Option<&'r FieldEntry> {
        match self.resolve(token, owner) {
            Resolution::Resolved(entry) => Some(entry),
            Resolution::Unresolved(_) => None,
        }
    }

    /// Identifier to emit for a token, resolved or stripped
    pub fn identifier(&self, token: &str, owner: Option<&str>) -> String {
        self.resolve(token, owner).into_text()
    }
}

/// Inner name of a `${name}` token
fn brace_name(token: &str) -> Option<&str> {
    let name = token.strip_prefix("${")?.strip_suffix('}')?.trim();
    let valid = !name.is_empty() && name.bytes().all(|b| is_name_byte(b) || b == b'.');
    valid.then_some(name)
}

fn is_path_byte(b: u8) -> bool {
    is_name_byte(b) || b == b'.' || b == b'/'
}

fn path_end(bytes: &[u8], mut k: usize) -> usize {
    while k < bytes.len() && is_path_byte(bytes[k]) {
        k += 1;
    }
    k
}

/// End offset of the reference token starting at `i`, if one starts there
fn reference_end(source: &str, i: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let b = bytes[i];
    let next = bytes.get(i + 1).copied();

    if b == b'$' && next == Some(b'{') {
        let end = i + source[i..].find('}')? + 1;
        return brace_name(&source[i..end]).map(|_| end);
    }
    if !at_token_boundary(bytes, i) {
        return None;
    }
    if bytes[i..].starts_with(CURRENT_FN.as_bytes()) {
        let after = i + CURRENT_FN.len();
        return Some(match bytes.get(after) {
            Some(b'/') => path_end(bytes, after),
            _ => after,
        });
    }
    match b {
        // `.5` is a number, not a path
        b'.' if !next.is_some_and(|n| n.is_ascii_digit()) => Some(path_end(bytes, i)),
        b'/' if next.is_some_and(is_name_start) => Some(path_end(bytes, i)),
        _ => None,
    }
}

fn starts_with_word(text: &str) -> bool {
    text.bytes().next().is_some_and(is_word_byte)
}

fn ends_in_word(text: &str) -> bool {
    text.bytes().next_back().is_some_and(is_word_byte)
}

/// Replace every field reference outside string literals with its
/// identifier. Unresolved references are reported as warnings.
///
/// An identifier that would run into an adjacent word (`${a}and${b}`) is
/// separated from it by a space so the two never merge into one name.
pub fn resolve_references(
    source: &str,
    resolver: &FieldResolver<'_>,
    owner: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\'' || bytes[i] == b'"' {
            match literal_end(source, i) {
                Some(end) => {
                    i = end;
                    continue;
                }
                None => break,
            }
        }

        let Some(end) = reference_end(source, i) else {
            i += 1;
            continue;
        };

        let token = &source[i..end];
        let resolution = resolver.resolve(token, owner);
        if !resolution.is_resolved() {
            log::debug!("unresolved field reference {token}");
            diagnostics.push(Diagnostic::warning(
                FSX0001,
                format!("Unresolved field reference '{token}'"),
            ));
        }
        let text = resolution.into_text();
        out.push_str(&source[last..i]);
        if ends_in_word(&out) && starts_with_word(&text) {
            out.push(' ');
        }
        out.push_str(&text);
        if ends_in_word(&text) && starts_with_word(&source[end..]) {
            out.push(' ');
        }
        last = end;
        i = end;
    }

    out.push_str(&source[last..]);
    out
}
