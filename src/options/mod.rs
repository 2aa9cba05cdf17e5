//! Option-token handling.
//!
//! Components are configured through a flat, order-sensitive array of tokens such as
//! `["-C", "0.25", "-K", "PolyKernel -E 1.0", "-W", "J48", "--", "-M", "2"]`. This module
//! converts between that array and its single-string command-line form, and provides the
//! [`OptionCursor`] used to consume named options from an array.

use crate::error::OptionsError;
use itertools::Itertools;

mod cursor;

pub use cursor::OptionCursor;

/// The token that separates a component's own options from the options of its base learner.
pub const SEPARATOR: &str = "--";

/// Splits a command-line string into option tokens.
///
/// Tokens are separated by whitespace. A token that starts with a double quote runs until the
/// matching unescaped quote and may contain whitespace; inside quotes, backslash escapes are
/// resolved (`\"`, `\\`, `\n`, `\r`, `\t`).
pub fn split_options(input: &str) -> Result<Vec<String>, OptionsError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('r') => token.push('\r'),
                        Some('t') => token.push('\t'),
                        Some(other) => token.push(other),
                        None => break,
                    },
                    other => token.push(other),
                }
            }
            if !closed {
                return Err(OptionsError::UnterminatedQuote(input.to_string()));
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

/// Joins option tokens into a single command-line string that [`split_options`] reverses.
pub fn join_options<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens.iter().map(|t| quote_token(t.as_ref())).join(" ")
}

/// Quotes a single token if it would not survive whitespace splitting on its own.
pub fn quote_token(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if needs_quotes {
        format!("\"{}\"", back_quote(token))
    } else {
        token.to_string()
    }
}

/// Escapes the characters that carry meaning inside a quoted token.
pub fn back_quote(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builds the single-token form of an embedded component: its type name followed by its
/// joined options.
pub fn embed_component<S: AsRef<str>>(type_name: &str, options: &[S]) -> String {
    if options.is_empty() {
        type_name.to_string()
    } else {
        format!("{} {}", type_name, join_options(options))
    }
}

/// Splits an embedded component token into its type name and its option tokens.
///
/// Returns `None` for a token that contains no type name at all.
pub fn split_component(spec: &str) -> Result<Option<(String, Vec<String>)>, OptionsError> {
    let mut tokens = split_options(spec)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let type_name = tokens.remove(0);
    Ok(Some((type_name, tokens)))
}

/// True for tokens such as `-1` or `-0.5` that start with a hyphen but are values, not switches.
pub(crate) fn is_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}
