//! Byte-level helpers shared by the rewrite passes
//!
//! Every pass walks the expression left to right and must skip string
//! literals. XPath literals have no escape sequences: a literal opened by
//! `'` ends at the next `'`, one opened by `"` at the next `"`. All
//! delimiters are ASCII, so slicing at the offsets returned here always
//! lands on a char boundary.

use std::fmt;

/// Bytes that may appear inside an XPath name (after the first byte).
/// Every byte of a multi-byte character counts, so a name run never ends
/// inside a character.
#[inline]
pub fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':') || !b.is_ascii()
}

/// Bytes that glue onto an adjacent identifier
#[inline]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii()
}

/// Bytes that may start an XPath name
#[inline]
pub fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Whether `b` opens a string literal
#[inline]
pub fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

/// Whether offset `i` starts a new token, i.e. the previous byte cannot be
/// part of a name, path or call.
pub fn at_token_boundary(bytes: &[u8], i: usize) -> bool {
    match i.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(prev) => !(is_name_byte(prev) || matches!(prev, b')' | b']' | b'.' | b'/' | b'}' | b'$')),
    }
}

/// End offset (one past the closing quote) of the literal opening at
/// `start`, or `None` if it is unterminated.
pub fn literal_end(source: &str, start: usize) -> Option<usize> {
    let quote = *source.as_bytes().get(start)?;
    if !is_quote(quote) {
        return None;
    }
    source[start + 1..]
        .bytes()
        .position(|b| b == quote)
        .map(|off| start + 1 + off + 1)
}

/// A complete string literal token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLiteral<'a> {
    /// Quote character used in the source
    pub quote: char,
    /// Text between the quotes
    pub content: &'a str,
}

impl<'a> StringLiteral<'a> {
    /// Parse `text` (surrounding whitespace ignored) as exactly one literal
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.trim();
        let end = literal_end(text, 0)?;
        if end != text.len() {
            return None;
        }
        Some(Self {
            quote: text[..1].chars().next()?,
            content: &text[1..end - 1],
        })
    }

    /// Render with double quotes, falling back to single quotes when the
    /// content itself holds a double quote
    pub fn to_double_quoted(&self) -> String {
        quote_content(self.content)
    }
}

impl fmt::Display for StringLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{q}{}{q}", self.content, q = self.quote)
    }
}

/// Quote `content` for the target grammar, preferring double quotes
pub fn quote_content(content: &str) -> String {
    if content.contains('"') {
        format!("'{content}'")
    } else {
        format!("\"{content}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("'abc' = x", 0, Some(5))]
    #[case("\"a'b\"", 0, Some(5))]
    #[case("'unterminated", 0, None)]
    #[case("x", 0, None)]
    #[case("''", 0, Some(2))]
    fn test_literal_end(#[case] source: &str, #[case] start: usize, #[case] expected: Option<usize>) {
        assert_eq!(literal_end(source, start), expected);
    }

    #[test]
    fn test_string_literal_parse() {
        let lit = StringLiteral::parse(" 'yes' ").unwrap();
        assert_eq!(lit.quote, '\'');
        assert_eq!(lit.content, "yes");
        assert_eq!(lit.to_string(), "'yes'");
        assert_eq!(lit.to_double_quoted(), "\"yes\"");

        assert!(StringLiteral::parse("'a' = 'b'").is_none());
        assert!(StringLiteral::parse("${a}").is_none());
    }

    #[test]
    fn test_double_quote_fallback() {
        let lit = StringLiteral::parse(r#"'say "hi"'"#).unwrap();
        assert_eq!(lit.to_double_quoted(), r#"'say "hi"'"#);
    }

    #[test]
    fn test_token_boundary() {
        let bytes = b"a.b (x";
        assert!(at_token_boundary(bytes, 0));
        assert!(!at_token_boundary(bytes, 2));
        assert!(at_token_boundary(bytes, 4));
        assert!(at_token_boundary(bytes, 5));
    }

    #[test]
    fn test_multibyte_characters_stay_inside_names() {
        let bytes = "prénom x".as_bytes();
        assert!(!at_token_boundary(bytes, 3));
        assert!(!at_token_boundary(bytes, 4));
        assert!(at_token_boundary(bytes, 8));
        assert!(is_word_byte(bytes[2]) && !is_word_byte(b'-'));
    }
}
