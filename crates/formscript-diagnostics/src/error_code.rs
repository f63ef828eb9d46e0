//! Error codes following a structured numbering system
//!
//! Error code ranges:
//! - FSX0001-FSX0099: Conversion diagnostics (reported, never fatal)
//! - FSX0100-FSX0199: Field registry errors
//! - FSX0400-FSX0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a conversion diagnostic (0001-0099)
    pub const fn is_conversion_diagnostic(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a registry error (0100-0199)
    pub const fn is_registry_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FSX{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Conversion diagnostics (0001-0099)
    map.insert(1, ErrorInfo::new("Unresolved field reference")
        .with_help("The reference was emitted with its delimiters stripped; declare the field in the registry"));
    map.insert(2, ErrorInfo::new("Unbalanced function call")
        .with_help("The call was left untouched"));
    map.insert(3, ErrorInfo::new("Unknown function"));
    map.insert(4, ErrorInfo::new("Unexpected argument count"));

    // Registry errors (0100-0199)
    map.insert(100, ErrorInfo::new("Empty field path"));
    map.insert(101, ErrorInfo::new("Duplicate field path"));
    map.insert(102, ErrorInfo::new("Unknown field"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));
    map.insert(406, ErrorInfo::new("Invalid format"));

    map
});

// Conversion diagnostics
pub const FSX0001: ErrorCode = ErrorCode::new(1);
pub const FSX0002: ErrorCode = ErrorCode::new(2);
pub const FSX0003: ErrorCode = ErrorCode::new(3);
pub const FSX0004: ErrorCode = ErrorCode::new(4);

// Registry errors
pub const FSX0100: ErrorCode = ErrorCode::new(100);
pub const FSX0101: ErrorCode = ErrorCode::new(101);
pub const FSX0102: ErrorCode = ErrorCode::new(102);

// System errors
pub const FSX0400: ErrorCode = ErrorCode::new(400);
pub const FSX0401: ErrorCode = ErrorCode::new(401);
pub const FSX0402: ErrorCode = ErrorCode::new(402);
pub const FSX0406: ErrorCode = ErrorCode::new(406);
