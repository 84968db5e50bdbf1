//! Identifier validation, quoting and the quote-juggling helpers used when
//! re-synthesizing DDL from driver metadata.
//!
//! SQL identifiers cannot be bound as statement parameters, so DDL is built
//! as text. Names coming from callers are validated before they are quoted,
//! and every quoting function escapes the quote character by doubling it.

use crate::error::{AdapterError, Result};

/// Maximum identifier length (Derby's limit, also the widest among the
/// family of JDBC dialects).
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier supplied by a caller.
///
/// Rejects empty names, names containing null bytes and names longer than
/// [`MAX_IDENTIFIER_LENGTH`].
///
/// # Errors
///
/// Returns `AdapterError::Argument` describing the problem.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AdapterError::Argument(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(AdapterError::Argument(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(AdapterError::Argument(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote an identifier with ANSI double quotes, doubling embedded quotes.
///
/// ```ignore
/// assert_eq!(quote_ansi("users"), "\"users\"");
/// assert_eq!(quote_ansi("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_ansi(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an identifier for a dialect that folds identifiers to upper case.
pub fn quote_upper(name: &str) -> String {
    quote_ansi(&name.to_uppercase())
}

/// Quote each dot-separated part of a possibly schema-qualified name.
pub fn qualify_with(name: &str, quote: impl Fn(&str) -> String) -> String {
    name.split('.').map(quote).collect::<Vec<_>>().join(".")
}

/// Wrap a name in double quotes without escaping.
pub fn add_quotes(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Remove one level of matching single or double quotes.
///
/// Strings that are not wrapped in the same quote character on both ends
/// are returned unchanged.
pub fn strip_quotes(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Double every embedded double quote.
pub fn expand_double_quotes(name: &str) -> String {
    name.replace('"', "\"\"")
}

/// Render a string as a single-quoted SQL literal.
pub fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
