//! Form logic conversion for survey engines
//!
//! This crate ties the workspace together:
//! - Field registries built from form descriptions
//! - Expression conversion from the XPath subset to Expression Script
//! - Diagnostics for everything that degrades
//! - The `formscript` command-line tool (with the `cli` feature)
//!
//! # Example
//!
//! ```
//! use formscript::{FieldRegistry, Transpiler};
//!
//! let registry = FieldRegistry::from_paths(["/data/age", "/data/country"]).unwrap();
//! let transpiler = Transpiler::new(&registry);
//!
//! assert_eq!(
//!     transpiler.transpile("${age} >= 18 and ${country} = 'USA'"),
//!     "age >= 18  and  country == 'USA'",
//! );
//! ```

pub use formscript_diagnostics as diagnostics;
pub use formscript_registry as registry;
pub use formscript_transpiler as transpiler;

pub use formscript_diagnostics::{Diagnostic, FormScriptError, Result, Severity};
pub use formscript_registry::{FieldDecl, FieldRegistry};
pub use formscript_transpiler::{transpile, Conversion, QuotePolicy, TranspileOptions, Transpiler};

pub mod form;

pub use form::{ConvertedExpression, ExpressionKind, FormDescription, FormExpression};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
