//! Identifier sanitization for the target survey format
//!
//! Question codes must be alphanumeric, start with a letter and fit in
//! [`MAX_FIELD_IDENTIFIER_LEN`] characters. Answer codes share the alphabet
//! but are limited to [`MAX_ANSWER_CODE_LEN`] characters.

use std::collections::HashSet;

/// Maximum length of a sanitized field identifier
pub const MAX_FIELD_IDENTIFIER_LEN: usize = 20;

/// Maximum length of a sanitized answer code
pub const MAX_ANSWER_CODE_LEN: usize = 5;

fn alphanumeric(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Sanitize a field name into a question code.
///
/// `adult_consent` becomes `adultconsent`; names that would start with a
/// digit (or are empty after filtering) get a `q` prefix.
pub fn sanitize_field_name(name: &str) -> String {
    let mut cleaned = alphanumeric(name);
    if cleaned.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        cleaned.insert(0, 'q');
    }
    cleaned.truncate(MAX_FIELD_IDENTIFIER_LEN);
    cleaned
}

/// Sanitize a choice value into an answer code
pub fn sanitize_answer_code(value: &str) -> String {
    let mut cleaned = alphanumeric(value);
    if cleaned.is_empty() {
        cleaned.push('A');
    }
    cleaned.truncate(MAX_ANSWER_CODE_LEN);
    cleaned
}

/// Allocates unique, length-bounded names.
///
/// Uniqueness is case-insensitive since the survey engine compares codes
/// that way. Collisions are resolved with a numeric suffix, shortening the
/// base so the result never exceeds `max_len`.
#[derive(Debug, Clone)]
pub struct UniqueNames {
    max_len: usize,
    used: HashSet<String>,
}

impl UniqueNames {
    /// Create an allocator for names of at most `max_len` characters
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            used: HashSet::new(),
        }
    }

    /// Mark a name as taken. Returns false if it was already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_ascii_lowercase())
    }

    /// Check whether a name is taken
    pub fn is_taken(&self, name: &str) -> bool {
        self.used.contains(&name.to_ascii_lowercase())
    }

    /// Return `base` if free, otherwise the first free `base` + counter
    pub fn allocate(&mut self, base: &str) -> String {
        let mut base = base.to_string();
        base.truncate(self.max_len);
        if self.reserve(&base) {
            return base;
        }

        let mut counter: usize = 1;
        loop {
            let suffix = counter.to_string();
            let keep = self.max_len.saturating_sub(suffix.len());
            let candidate = format!("{}{}", &base[..base.len().min(keep)], suffix);
            if self.reserve(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}
