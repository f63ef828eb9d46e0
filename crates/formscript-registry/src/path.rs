//! Reference path parsing and normalization
//!
//! Handles the path forms an expression can use to point at a field:
//! absolute (`/data/group/name`), relative (`../name`, `./name`, `.`) and
//! `current()`-rooted (`current()/../name`). Relative paths are evaluated
//! with the owning field as the context node.

use std::fmt;

/// Marker for the context node function
pub const CURRENT_FN: &str = "current()";

/// One location step in a reference path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.` or `current()`
    Current,
    /// `..`
    Parent,
    /// A named child
    Child(String),
}

/// A parsed reference path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    absolute: bool,
    steps: Vec<Step>,
}

impl FieldPath {
    /// Parse a path token. Empty segments (`a//b`, trailing `/`) are ignored.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (absolute, rest) = match text.strip_prefix(CURRENT_FN) {
            Some(rest) => (false, rest),
            None => match text.strip_prefix('/') {
                Some(rest) => (true, rest),
                None => (false, text),
            },
        };

        let mut steps = Vec::new();
        if text.starts_with(CURRENT_FN) {
            steps.push(Step::Current);
        }
        for segment in rest.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            steps.push(match segment {
                "." => Step::Current,
                ".." => Step::Parent,
                name => Step::Child(name.to_string()),
            });
        }

        Self { absolute, steps }
    }

    /// Whether the path starts at the document root
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The location steps
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The final named step, if the path ends in one
    pub fn name(&self) -> Option<&str> {
        match self.steps.last() {
            Some(Step::Child(name)) => Some(name),
            _ => None,
        }
    }

    /// Whether the path points at the context node itself (`.`, `current()`)
    pub fn is_self(&self) -> bool {
        !self.absolute && !self.steps.is_empty() && self.steps.iter().all(|s| *s == Step::Current)
    }

    /// Evaluate the path to an absolute path string.
    ///
    /// Relative paths need `context`, the absolute path of the owning field;
    /// without it they cannot be evaluated and `None` is returned. Stepping
    /// above the root also yields `None`.
    pub fn resolve(&self, context: Option<&str>) -> Option<String> {
        let mut segments: Vec<&str> = if self.absolute {
            Vec::new()
        } else {
            let context = context?;
            if !context.starts_with('/') {
                return None;
            }
            context.split('/').filter(|s| !s.is_empty()).collect()
        };

        for step in &self.steps {
            match step {
                Step::Current => {}
                Step::Parent => {
                    segments.pop()?;
                }
                Step::Child(name) => segments.push(name),
            }
        }

        Some(format!("/{}", segments.join("/")))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "/")?;
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match step {
                Step::Current => write!(f, ".")?,
                Step::Parent => write!(f, "..")?,
                Step::Child(name) => write!(f, "{name}")?,
            }
        }
        Ok(())
    }
}

/// Normalize a declared path: trim, collapse empty segments, drop a
/// trailing slash. Bare names are returned unchanged.
pub fn normalize_declared_path(path: &str) -> String {
    let path = path.trim();
    if !path.contains('/') {
        return path.to_string();
    }
    let absolute = path.starts_with('/');
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Final segment of a declared path
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_relative_current() {
        let path = FieldPath::parse("current()/../q1");
        assert!(!path.is_absolute());
        assert_eq!(
            path.steps(),
            &[Step::Current, Step::Parent, Step::Child("q1".into())]
        );
        assert_eq!(path.name(), Some("q1"));
    }

    #[test]
    fn test_resolve_against_context() {
        let ctx = Some("/data/g1/q2");
        assert_eq!(FieldPath::parse("current()/../q1").resolve(ctx).as_deref(), Some("/data/g1/q1"));
        assert_eq!(FieldPath::parse("../q1").resolve(ctx).as_deref(), Some("/data/g1/q1"));
        assert_eq!(FieldPath::parse("../../top").resolve(ctx).as_deref(), Some("/data/top"));
        assert_eq!(FieldPath::parse(".").resolve(ctx).as_deref(), Some("/data/g1/q2"));
        assert_eq!(FieldPath::parse("/data/g1/q1").resolve(None).as_deref(), Some("/data/g1/q1"));
    }

    #[test]
    fn test_resolve_without_context() {
        assert_eq!(FieldPath::parse("../q1").resolve(None), None);
        assert_eq!(FieldPath::parse("../q1").resolve(Some("q2")), None);
        assert_eq!(FieldPath::parse("../../../..").resolve(Some("/a/b")), None);
    }

    #[test]
    fn test_is_self() {
        assert!(FieldPath::parse(".").is_self());
        assert!(FieldPath::parse("current()").is_self());
        assert!(!FieldPath::parse("../x").is_self());
        assert!(!FieldPath::parse("/").is_self());
    }

    #[test]
    fn test_display_round_trips_shape() {
        assert_eq!(FieldPath::parse("current()/../q1").to_string(), "./../q1");
        assert_eq!(FieldPath::parse("/data//g1/").to_string(), "/data/g1");
    }

    #[test]
    fn test_normalize_declared_path() {
        assert_eq!(normalize_declared_path(" /data//grp/age/ "), "/data/grp/age");
        assert_eq!(normalize_declared_path("age"), "age");
        assert_eq!(last_segment("/data/grp/age"), "age");
        assert_eq!(last_segment("age"), "age");
    }
}
