//! Operator normalization
//!
//! `=` becomes `==`; `!=`, `<`, `>`, `<=` and `>=` are already valid in the
//! target grammar. `and` / `or` get exactly two spaces on each side
//! whatever the source spacing was. String literals are copied untouched.
//! Both rewrites are idempotent.

use crate::scanner::{is_name_byte, is_quote, literal_end, quote_content};

const BOOLEAN_OPERATORS: [&str; 2] = ["and", "or"];

/// Rewrite comparison and boolean operators to target syntax
pub fn normalize_operators(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len() + 8);
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if is_quote(b) {
            match literal_end(source, i) {
                Some(end) => {
                    i = end;
                    continue;
                }
                None => break,
            }
        }

        if b == b'=' {
            let prev = i.checked_sub(1).map(|p| bytes[p]);
            let next = bytes.get(i + 1).copied();
            let part_of_operator = matches!(prev, Some(b'!' | b'<' | b'>' | b'=')) || next == Some(b'=');
            if !part_of_operator {
                out.push_str(&source[last..i]);
                out.push_str("==");
                last = i + 1;
            }
            i += 1;
            continue;
        }

        if let Some(word) = boolean_operator_at(bytes, i) {
            out.push_str(source[last..i].trim_end_matches(|c: char| c.is_ascii_whitespace()));
            out.push_str("  ");
            out.push_str(word);
            out.push_str("  ");
            i += word.len();
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            last = i;
            continue;
        }

        i += 1;
    }

    out.push_str(&source[last..]);
    out
}

/// The boolean operator word starting at `i`, if `i` starts a whole word
fn boolean_operator_at(bytes: &[u8], i: usize) -> Option<&'static str> {
    if i > 0 && (is_name_byte(bytes[i - 1]) || bytes[i - 1] == b'$' || bytes[i - 1] == b'.') {
        return None;
    }
    BOOLEAN_OPERATORS.into_iter().find(|word| {
        let end = i + word.len();
        bytes.get(i..end) == Some(word.as_bytes())
            && bytes.get(end).is_none_or(|&b| !is_name_byte(b))
    })
}

/// Re-quote every string literal with double quotes, keeping single quotes
/// for content that contains a double quote
pub fn requote_literals(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if !is_quote(bytes[i]) {
            i += 1;
            continue;
        }
        let Some(end) = literal_end(source, i) else {
            break;
        };
        out.push_str(&source[last..i]);
        out.push_str(&quote_content(&source[i + 1..end - 1]));
        last = end;
        i = end;
    }

    out.push_str(&source[last..]);
    out
}
