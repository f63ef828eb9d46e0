//! The conversion pipeline
//!
//! Passes run in a fixed order for every expression and every argument:
//!
//! 1. `Stage::Logical` calls (`not`, `if`), arguments converted first
//! 2. `Stage::Predicate` calls (`selected`), arguments converted first
//! 3. field references
//! 4. operators, then literal re-quoting under [`QuotePolicy::Double`]
//!
//! Operator normalization must come last: before the calls are flattened
//! their argument lists still hold source-grammar syntax. Every pass is a
//! no-op on its own output, so re-running the pipeline on converted text
//! changes nothing.

use crate::extract::{scan_calls, Extraction};
use crate::operators::{normalize_operators, requote_literals};
use crate::options::{QuotePolicy, TranspileOptions};
use crate::resolver::{resolve_references, FieldResolver};
use crate::rules::{Argument, ConvertedCall, RuleContext, RuleSet, Stage};
use formscript_diagnostics::{Diagnostic, Severity, FSX0002, FSX0003, FSX0004};
use formscript_registry::FieldRegistry;
use serde::Serialize;
use std::collections::HashSet;

/// Functions both grammars share; never reported as unknown
const SHARED_FUNCTIONS: [&str; 3] = ["true", "false", "current"];

/// Output of one conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// Expression in target syntax; content, not escaped for any file format
    pub output: String,
    /// Degradations encountered, in the order they were found
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Whether the conversion produced no warnings
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity != Severity::Info)
    }
}

/// Converts expressions for one form.
///
/// Holds only a shared borrow of the registry plus immutable rules and
/// options, so one transpiler can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Transpiler<'r> {
    resolver: FieldResolver<'r>,
    rules: RuleSet,
    options: TranspileOptions,
}

impl<'r> Transpiler<'r> {
    /// Transpiler with the built-in rules and default options
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self::with_options(registry, TranspileOptions::default())
    }

    /// Transpiler with the built-in rules
    pub fn with_options(registry: &'r FieldRegistry, options: TranspileOptions) -> Self {
        Self {
            resolver: FieldResolver::new(registry),
            rules: RuleSet::builtin(),
            options,
        }
    }

    /// Replace the rule set
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Active options
    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    /// Active rules
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Convert an expression, discarding diagnostics
    pub fn transpile(&self, expression: &str) -> String {
        self.transpile_with_diagnostics(expression).output
    }

    /// Convert an expression owned by the configured current field
    pub fn transpile_with_diagnostics(&self, expression: &str) -> Conversion {
        self.run(expression, self.options.current_field.as_deref())
    }

    /// Convert an expression owned by `owner`, overriding the configured
    /// current field
    pub fn transpile_for(&self, expression: &str, owner: &str) -> Conversion {
        self.run(expression, Some(owner))
    }

    fn run(&self, expression: &str, owner: Option<&str>) -> Conversion {
        let mut session = Session {
            transpiler: self,
            owner,
            depth: 0,
            diagnostics: Vec::new(),
        };
        let output = session.convert(expression);
        session.report_unknown_functions(&output);

        let mut seen = HashSet::new();
        let mut diagnostics = session.diagnostics;
        diagnostics.retain(|d| seen.insert((d.code, d.message.clone())));

        log::debug!("converted {expression:?} -> {output:?}");
        Conversion { output, diagnostics }
    }
}

/// Convert one expression with the built-in rules and default options
pub fn transpile(expression: &str, registry: &FieldRegistry) -> String {
    Transpiler::new(registry).transpile(expression)
}

struct Session<'t, 'r> {
    transpiler: &'t Transpiler<'r>,
    owner: Option<&'t str>,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Session<'_, '_> {
    fn convert(&mut self, text: &str) -> String {
        self.depth += 1;
        let logical = self.rewrite_calls(text, Stage::Logical);
        let predicates = self.rewrite_calls(&logical, Stage::Predicate);
        let resolved = resolve_references(
            &predicates,
            &self.transpiler.resolver,
            self.owner,
            &mut self.diagnostics,
        );
        let mut normalized = normalize_operators(&resolved);
        if self.transpiler.options.quote_policy == QuotePolicy::Double {
            normalized = requote_literals(&normalized);
        }
        self.depth -= 1;

        if self.depth == 0 {
            log::trace!("passes: {logical:?} | {predicates:?} | {resolved:?} | {normalized:?}");
        }
        normalized
    }

    fn rewrite_calls(&mut self, text: &str, stage: Stage) -> String {
        let transpiler = self.transpiler;
        let extractions = scan_calls(text, |name| transpiler.rules.runs_in(name, stage));
        if extractions.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for extraction in extractions {
            let call = match extraction {
                Extraction::Call(call) => call,
                Extraction::Unbalanced { name, span } => {
                    log::debug!("unbalanced {name}( at {span}");
                    self.diagnostics.push(Diagnostic::warning(
                        FSX0002,
                        format!("Unbalanced call '{}' left untouched", span.slice(text)),
                    ));
                    continue;
                }
            };

            let args = call
                .args
                .iter()
                .map(|raw| Argument {
                    raw: raw.clone(),
                    converted: self.convert(raw.inner),
                })
                .collect();
            let converted = ConvertedCall {
                name: call.name,
                args,
                span: call.span,
            };

            let Some(entry) = transpiler.rules.get(call.name) else {
                continue;
            };
            let replacement = if entry.arity.contains(&converted.args.len()) {
                let ctx = RuleContext {
                    resolver: &transpiler.resolver,
                    options: &transpiler.options,
                    owner: self.owner,
                };
                (entry.rule)(&converted, &ctx)
            } else {
                self.diagnostics.push(Diagnostic::warning(
                    FSX0004,
                    format!(
                        "{}() takes {} to {} arguments, found {}",
                        call.name,
                        entry.arity.start(),
                        entry.arity.end(),
                        converted.args.len()
                    ),
                ));
                converted.to_call_syntax()
            };

            out.push_str(&text[last..call.span.start]);
            out.push_str(&replacement);
            last = call.span.end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Report calls with no rule that are not shared by both grammars.
    /// They stay in the output as written.
    fn report_unknown_functions(&mut self, text: &str) {
        for extraction in scan_calls(text, |name| !SHARED_FUNCTIONS.contains(&name)) {
            let Extraction::Call(call) = extraction else {
                continue;
            };
            if !self.transpiler.rules.contains(call.name) {
                self.diagnostics.push(Diagnostic::info(
                    FSX0003,
                    format!("Function '{}' has no conversion rule and was passed through", call.name),
                ));
            }
            for arg in &call.args {
                self.report_unknown_functions(arg.inner);
            }
        }
    }
}
