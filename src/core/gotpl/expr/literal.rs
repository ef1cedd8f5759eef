//! Literal recognition and string requoting.

use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::quote::QuoteTracker;
use crate::utils::error::{ExprError, ExprResult};

lazy_static! {
    static ref NUMBER_LITERAL: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
}

const KEYWORDS: [&str; 4] = ["true", "false", "nil", "null"];

/// Rewrite `expr` if it is a literal; `Ok(None)` when it is not.
pub fn map_literal(expr: &str) -> ExprResult<Option<String>> {
    if KEYWORDS.contains(&expr) || NUMBER_LITERAL.is_match(expr) {
        return Ok(Some(expr.to_string()));
    }
    match string_literal_quote(expr) {
        Some('"') => Ok(Some(expr.to_string())),
        Some(_) => {
            let inner = &expr[1..expr.len() - 1];
            let value = unescape_single_quoted(inner, expr)?;
            Ok(Some(go_quote(&value)))
        }
        None => Ok(None),
    }
}

/// Quote character of `expr` when the whole text is exactly one string
/// literal, meaning the opening quote is first and its matching close is last.
///
/// A literal whose last quote is escaped still counts, so that unescaping
/// reports the dangling backslash.
fn string_literal_quote(expr: &str) -> Option<char> {
    let quote = expr.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let mut tracker = QuoteTracker::new();
    for (i, c) in expr.char_indices() {
        tracker.feed(c);
        if i > 0 && !tracker.in_quote() {
            return (i + c.len_utf8() == expr.len()).then_some(quote);
        }
    }
    (expr.len() > 1 && expr.ends_with(quote)).then_some(quote)
}

fn unescape_single_quoted(inner: &str, literal: &str) -> ExprResult<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or_else(|| {
            ExprError::new(format!("unterminated escape in literal {:?}", literal))
        })?;
        out.push(match escaped {
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            other => {
                return Err(ExprError::new(format!(
                    "unsupported escape sequence \\{} in literal {:?}",
                    other, literal
                )))
            }
        });
    }
    Ok(out)
}

/// Double-quote `s` using the target language's string escapes.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
