//! Call extraction
//!
//! Locates `name(...)` constructs in raw expression text. Call boundaries
//! are found by tracking paren depth and quote state rather than by pattern
//! matching, so nested calls such as `not(selected(${a}, 'x'))` are
//! delimited correctly. Arguments are split at commas that sit directly
//! inside the call's own parens.

use crate::scanner::{at_token_boundary, is_name_byte, is_name_start, is_quote, literal_end};
use formscript_diagnostics::{Span, Spanned};
use smallvec::SmallVec;

/// A function call found in expression text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall<'a> {
    /// Function name as written
    pub name: &'a str,
    /// Raw argument text, untrimmed, with spans into the scanned source
    pub args: SmallVec<[Spanned<&'a str>; 4]>,
    /// From the first byte of the name to one past the closing paren
    pub span: Span,
}

impl FunctionCall<'_> {
    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Result of scanning for one call occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// A balanced call
    Call(FunctionCall<'a>),
    /// `name(` with no matching close paren; the text is left untouched
    Unbalanced {
        name: &'a str,
        /// From the name to the end of the source
        span: Span,
    },
}

/// Find every call whose name satisfies `accept`, left to right.
///
/// Occurrences nested inside an accepted call's arguments are not reported
/// separately; callers recurse into the arguments instead. Calls to names
/// that are not accepted are transparent: their arguments are scanned.
/// After an unbalanced occurrence, scanning resumes right after its open
/// paren so that balanced calls inside it are still found.
pub fn scan_calls<'a>(source: &'a str, accept: impl Fn(&str) -> bool) -> Vec<Extraction<'a>> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut found = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if is_quote(b) {
            match literal_end(source, i) {
                Some(end) => {
                    i = end;
                    continue;
                }
                // An unterminated literal swallows the rest of the text
                None => break,
            }
        }

        if b == b'$' && bytes.get(i + 1) == Some(&b'{') {
            i = source[i..].find('}').map_or(i + 2, |off| i + off + 1);
            continue;
        }

        if is_name_start(b) && at_token_boundary(bytes, i) {
            let start = i;
            while i < len && is_name_byte(bytes[i]) {
                i += 1;
            }
            let name = &source[start..i];

            let mut open = i;
            while open < len && bytes[open].is_ascii_whitespace() {
                open += 1;
            }
            if open < len && bytes[open] == b'(' && accept(name) {
                match match_call(source, start, open) {
                    Some(call) => {
                        log::trace!("extracted {}() at {}", call.name, call.span);
                        i = call.span.end;
                        found.push(Extraction::Call(call));
                    }
                    None => {
                        found.push(Extraction::Unbalanced {
                            name,
                            span: Span::new(start, len),
                        });
                        i = open + 1;
                    }
                }
            }
            continue;
        }

        i += 1;
    }

    found
}

/// Find every balanced call to `name`
pub fn extract_calls<'a>(source: &'a str, name: &str) -> Vec<FunctionCall<'a>> {
    scan_calls(source, |candidate| candidate == name)
        .into_iter()
        .filter_map(|extraction| match extraction {
            Extraction::Call(call) => Some(call),
            Extraction::Unbalanced { .. } => None,
        })
        .collect()
}

/// Match the call whose name starts at `name_start` and whose open paren
/// is at `open`. Returns `None` if the parens never balance.
fn match_call(source: &str, name_start: usize, open: usize) -> Option<FunctionCall<'_>> {
    let bytes = source.as_bytes();
    let name = source[name_start..open].trim_end();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut arg_start = open + 1;
    let mut args: SmallVec<[Spanned<&str>; 4]> = SmallVec::new();

    for (k, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let last = &source[arg_start..k];
                    // `f()` has no arguments, `f(a, )` has an empty second one
                    if !args.is_empty() || !last.trim().is_empty() {
                        args.push(Spanned::new(last, Span::new(arg_start, k)));
                    }
                    return Some(FunctionCall {
                        name,
                        args,
                        span: Span::new(name_start, k + 1),
                    });
                }
            }
            b',' if depth == 1 => {
                args.push(Spanned::new(&source[arg_start..k], Span::new(arg_start, k)));
                arg_start = k + 1;
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arg_texts<'a>(call: &FunctionCall<'a>) -> Vec<&'a str> {
        call.args.iter().map(|a| a.inner).collect()
    }

    #[test]
    fn test_simple_call() {
        let calls = extract_calls("selected(${a}, 'x') and ${b} = 1", "selected");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "selected");
        assert_eq!(arg_texts(&calls[0]), vec!["${a}", " 'x'"]);
        assert_eq!(calls[0].span, Span::new(0, 19));
    }

    #[test]
    fn test_nested_call_is_one_extraction() {
        let source = "not(not(${a} = 1))";
        let calls = extract_calls(source, "not");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].span.slice(source), source);
        assert_eq!(arg_texts(&calls[0]), vec!["not(${a} = 1)"]);
    }

    #[test]
    fn test_quotes_do_not_count_toward_depth() {
        let calls = extract_calls("if(${a} = ')', 'x,y', \"(\")", "if");
        assert_eq!(calls.len(), 1);
        assert_eq!(arg_texts(&calls[0]), vec!["${a} = ')'", " 'x,y'", " \"(\""]);
    }

    #[test]
    fn test_commas_in_nested_calls_do_not_split() {
        let calls = extract_calls("if(selected(${a}, 'b'), concat(1, 2), 3)", "if");
        assert_eq!(arg_texts(&calls[0]), vec!["selected(${a}, 'b')", " concat(1, 2)", " 3"]);
    }

    #[test]
    fn test_name_must_match_whole_token() {
        assert!(extract_calls("count-selected(${a})", "selected").is_empty());
        assert!(extract_calls("notify(1)", "not").is_empty());
        assert!(extract_calls("'not(1)'", "not").is_empty());
    }

    #[test]
    fn test_unknown_function_arguments_are_scanned() {
        let calls = extract_calls("concat(not(${a}), 'x')", "not");
        assert_eq!(calls.len(), 1);
        assert_eq!(arg_texts(&calls[0]), vec!["${a}"]);
    }

    #[test]
    fn test_zero_and_empty_arguments() {
        let calls = extract_calls("true()", "true");
        assert_eq!(calls[0].arity(), 0);

        let calls = extract_calls("f(a, )", "f");
        assert_eq!(arg_texts(&calls[0]), vec!["a", " "]);
    }

    #[test]
    fn test_whitespace_before_paren() {
        let calls = extract_calls("not (${a})", "not");
        assert_eq!(calls[0].name, "not");
        assert_eq!(arg_texts(&calls[0]), vec!["${a}"]);
    }

    #[test]
    fn test_unbalanced_call_reported() {
        let found = scan_calls("not(not(${a}) and 1", |n| n == "not");
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], Extraction::Unbalanced { name: "not", .. }));
        match &found[1] {
            Extraction::Call(call) => assert_eq!(call.span, Span::new(4, 13)),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_calls() {
        let calls = extract_calls("selected(${a}, 'x') or selected(${b}, 'y')", "selected");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].span.start, 23);
    }
}
