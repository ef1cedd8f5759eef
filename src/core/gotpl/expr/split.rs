//! Top-level scanning over FreeMarker expression text.
//!
//! "Top level" means outside string literals and outside any `(...)` or
//! `[...]` group. All operator detection in the rewriter goes through these
//! helpers, so an operator inside a quoted literal or a nested group is
//! never a split point.

use crate::core::quote::{find_matching, is_ident_char, unquoted_char_indices};

/// Iterate `(byte_index, char)` for characters at nesting depth 0 outside
/// string literals. Group delimiters themselves are not yielded.
pub fn top_level_chars(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut depth = 0usize;
    unquoted_char_indices(s).filter(move |&(_, c)| match c {
        '(' | '[' => {
            depth += 1;
            false
        }
        ')' | ']' => {
            depth = depth.saturating_sub(1);
            false
        }
        _ => depth == 0,
    })
}

/// Split `expr` at every top-level occurrence of `sep`.
///
/// Returns an empty vector when `sep` does not occur at the top level.
/// Parts are trimmed and may be empty.
pub fn split_top_level<'e>(expr: &'e str, sep: &str) -> Vec<&'e str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, _) in top_level_chars(expr) {
        if i < start {
            continue;
        }
        if expr[i..].starts_with(sep) {
            parts.push(expr[start..i].trim());
            start = i + sep.len();
        }
    }
    if parts.is_empty() {
        return parts;
    }
    parts.push(expr[start..].trim());
    parts
}

/// Comparison operators in the order they are tried.
pub const COMPARISON_OPERATORS: [&str; 7] = ["==", "!=", ">=", "<=", ">", "<", "="];

/// Find the first comparison operator that splits `expr` into exactly two
/// operands.
///
/// A bare `=` is skipped when either operand still holds a top-level `<` or
/// `>`, which would mean a longer operator was mis-split.
pub fn split_top_level_compare(expr: &str) -> Option<(&str, &str, &'static str)> {
    for op in COMPARISON_OPERATORS {
        let parts = split_top_level(expr, op);
        if parts.len() != 2 {
            continue;
        }
        if op == "=" && (has_top_level_angle(parts[0]) || has_top_level_angle(parts[1])) {
            continue;
        }
        return Some((parts[0], parts[1], op));
    }
    None
}

fn has_top_level_angle(s: &str) -> bool {
    top_level_chars(s).any(|(_, c)| c == '<' || c == '>')
}

/// Characters that can end an operand, making a following `!` the binary
/// default operator rather than a negation.
fn ends_operand(c: char) -> bool {
    is_ident_char(c) || matches!(c, ')' | ']' | '"' | '\'' | '?')
}

/// Split at the first top-level default operator `!` (not `!=`).
///
/// The right-hand side is empty for the trailing form `x!`.
pub fn split_top_level_default(expr: &str) -> Option<(&str, &str)> {
    top_level_chars(expr)
        .filter(|&(i, c)| c == '!' && !expr[i + 1..].starts_with('='))
        .map(|(i, _)| (expr[..i].trim(), expr[i + 1..].trim()))
        .find(|(left, _)| left.chars().next_back().is_some_and(ends_operand))
}

/// Byte index of the first top-level `?`.
pub fn first_top_level_question(expr: &str) -> Option<usize> {
    top_level_chars(expr)
        .find(|&(_, c)| c == '?')
        .map(|(i, _)| i)
}

/// Split a call argument list at top-level commas. A blank list has no
/// arguments.
pub fn split_args(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if s.trim().is_empty() {
        return out;
    }
    let mut start = 0;
    for (i, c) in top_level_chars(s) {
        if c == ',' {
            out.push(s[start..i].trim());
            start = i + 1;
        }
    }
    out.push(s[start..].trim());
    out
}

/// Inner text of an expression wrapped entirely in one pair of parentheses.
pub fn strip_outer_paren(expr: &str) -> Option<&str> {
    if !expr.starts_with('(') || !expr.ends_with(')') {
        return None;
    }
    let close = find_matching(expr, 0, '(', ')')?;
    if close != expr.len() - 1 {
        return None;
    }
    Some(expr[1..close].trim())
}

/// Whether `expr` contains top-level arithmetic.
///
/// `+`, `*` and `/` always count. `-` counts only as a binary minus, when
/// both neighbouring characters are identifier characters, digits, a paren
/// or a double quote.
pub fn has_top_level_arithmetic(expr: &str) -> bool {
    top_level_chars(expr).any(|(i, c)| match c {
        '+' | '*' | '/' => true,
        '-' => {
            let prev = expr[..i].chars().next_back();
            let next = expr[i + 1..].chars().next();
            prev.is_some_and(|p| is_ident_char(p) || p == ')' || p == '"')
                && next.is_some_and(|n| is_ident_char(n) || n == '(' || n == '"')
        }
        _ => false,
    })
}
