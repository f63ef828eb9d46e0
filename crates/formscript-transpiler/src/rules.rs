//! Function conversion rules
//!
//! A rule rewrites one call whose arguments have already been converted
//! (innermost calls first), so a rule never sees an unconverted nested
//! call. Rules are registered per function name and grouped into stages
//! that the pipeline runs in a fixed order.

use crate::options::{QuotePolicy, TranspileOptions};
use crate::resolver::FieldResolver;
use crate::scanner::{quote_content, StringLiteral};
use formscript_diagnostics::{Span, Spanned};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Pipeline stage a rule runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Boolean structure: `not`, `if`
    Logical,
    /// Predicates over a field: `selected`
    Predicate,
}

/// A call argument after recursive conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument<'a> {
    /// Source text as extracted, untrimmed
    pub raw: Spanned<&'a str>,
    /// Converted text
    pub converted: String,
}

impl Argument<'_> {
    /// Trimmed source text
    pub fn source(&self) -> &str {
        self.raw.inner.trim()
    }

    /// Trimmed converted text
    pub fn text(&self) -> &str {
        self.converted.trim()
    }
}

/// A call whose arguments have been converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedCall<'a> {
    /// Function name
    pub name: &'a str,
    /// Converted arguments in order
    pub args: Vec<Argument<'a>>,
    /// Span of the original call
    pub span: Span,
}

impl ConvertedCall<'_> {
    /// Render as `name(a, b, ...)` from the converted arguments
    pub fn to_call_syntax(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(Argument::text).collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

/// What a rule may consult besides the call
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Field resolution over the form's registry
    pub resolver: &'a FieldResolver<'a>,
    /// Active options
    pub options: &'a TranspileOptions,
    /// Field owning the expression, if known
    pub owner: Option<&'a str>,
}

/// Rewrite of one call into target syntax
pub type ConversionRule = Arc<dyn Fn(&ConvertedCall<'_>, &RuleContext<'_>) -> String + Send + Sync>;

/// A registered rule
#[derive(Clone)]
pub struct RuleEntry {
    /// Stage the rule runs in
    pub stage: Stage,
    /// Accepted argument counts; calls outside it are reassembled as-is
    pub arity: RangeInclusive<usize>,
    /// The rewrite
    pub rule: ConversionRule,
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("stage", &self.stage)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Rules by exact function name
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, RuleEntry>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules: `not`, `if` and `selected`
    pub fn builtin() -> Self {
        let mut rules = Self::new();
        rules.register("not", Stage::Logical, 1..=1, Arc::new(convert_not));
        rules.register("if", Stage::Logical, 3..=3, Arc::new(convert_if));
        rules.register("selected", Stage::Predicate, 2..=2, Arc::new(convert_selected));
        rules
    }

    /// Register or replace the rule for `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        stage: Stage,
        arity: RangeInclusive<usize>,
        rule: ConversionRule,
    ) {
        self.rules.insert(name.into(), RuleEntry { stage, arity, rule });
    }

    /// Get the rule for a name
    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.rules.get(name)
    }

    /// Whether a rule exists for a name
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Whether the rule for `name` runs in `stage`
    pub fn runs_in(&self, name: &str, stage: Stage) -> bool {
        self.rules.get(name).is_some_and(|entry| entry.stage == stage)
    }
}

/// `not(expr)` keeps its shape; quoting inside is whatever the argument's
/// own conversion produced
pub fn convert_not(call: &ConvertedCall<'_>, _ctx: &RuleContext<'_>) -> String {
    call.to_call_syntax()
}

/// `if(cond, a, b)` keeps its shape with each argument converted
pub fn convert_if(call: &ConvertedCall<'_>, _ctx: &RuleContext<'_>) -> String {
    call.to_call_syntax()
}

/// `selected(field, 'value')` becomes `(field == "value")`.
///
/// The value is re-quoted to double quotes unless the policy is
/// [`QuotePolicy::Preserve`]. When the field declares an answer code for
/// the value, the code replaces it.
pub fn convert_selected(call: &ConvertedCall<'_>, ctx: &RuleContext<'_>) -> String {
    let field = &call.args[0];
    let value = &call.args[1];

    let rendered = match StringLiteral::parse(value.source()) {
        Some(literal) => {
            let content = ctx
                .resolver
                .entry(field.source(), ctx.owner)
                .and_then(|entry| entry.answer_code(literal.content))
                .unwrap_or(literal.content);
            match ctx.options.quote_policy {
                QuotePolicy::Preserve => StringLiteral { quote: literal.quote, content }.to_string(),
                QuotePolicy::SelectedOnly | QuotePolicy::Double => quote_content(content),
            }
        }
        None => value.text().to_string(),
    };

    format!("({} == {})", field.text(), rendered)
}
