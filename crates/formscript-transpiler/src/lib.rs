//! XPath-subset to Expression Script transpiler
//!
//! Rewrites the relevance, constraint and calculation expressions of a form
//! into the expression syntax of the target survey engine. The conversion is
//! a pure function of the expression text and a read-only [`FieldRegistry`]:
//!
//! 1. `not(...)` and `if(...)` calls are rewritten, innermost first
//! 2. `selected(field, 'value')` becomes `(field == "value")`
//! 3. remaining field references (`${name}`, paths, `.`) are resolved
//! 4. operators are normalized (`=` to `==`, `and`/`or` spacing)
//!
//! Nothing in the pipeline fails: unknown syntax is passed through and
//! reported as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use formscript_registry::FieldRegistry;
//! use formscript_transpiler::Transpiler;
//!
//! let registry = FieldRegistry::from_paths(["/data/consent", "/data/age"]).unwrap();
//! let transpiler = Transpiler::new(&registry);
//!
//! assert_eq!(
//!     transpiler.transpile("selected(${consent}, 'yes') and ${age} >= 18"),
//!     r#"(consent == "yes")  and  age >= 18"#,
//! );
//! ```

pub mod extract;
pub mod operators;
pub mod options;
pub mod pipeline;
pub mod resolver;
pub mod rules;
pub mod scanner;

pub use extract::{extract_calls, scan_calls, Extraction, FunctionCall};
pub use operators::{normalize_operators, requote_literals};
pub use options::{QuotePolicy, TranspileOptions};
pub use pipeline::{transpile, Conversion, Transpiler};
pub use resolver::{FieldResolver, Resolution};
pub use rules::{Argument, ConversionRule, ConvertedCall, RuleContext, RuleEntry, RuleSet, Stage};

pub use formscript_diagnostics::{Diagnostic, Severity};
pub use formscript_registry::FieldRegistry;
