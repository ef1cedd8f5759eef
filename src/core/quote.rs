//! Quote-aware character scanning shared by the lexer and the expression
//! rewriter.
//!
//! FreeMarker string literals use either quote character and backslash
//! escapes. Anything inside a literal is opaque to delimiter matching, so
//! every forward scan that looks for `}`, `>`, `]`, `)` or an operator feeds
//! its characters through a [`QuoteTracker`] first.

/// Incremental quoted-string state for a left-to-right scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteTracker {
    quote: Option<char>,
    escaped: bool,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next character.
    ///
    /// Returns `true` when the character belongs to a string literal
    /// (including its opening and closing quotes) and must be ignored by the
    /// caller's delimiter logic.
    pub fn feed(&mut self, c: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return true;
        }
        if c == '"' || c == '\'' {
            self.quote = Some(c);
            return true;
        }
        false
    }

    pub fn in_quote(&self) -> bool {
        self.quote.is_some()
    }
}

/// Iterate `(byte_index, char)` pairs of `s` that sit outside string
/// literals.
pub fn unquoted_char_indices(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut tracker = QuoteTracker::new();
    s.char_indices().filter(move |&(_, c)| !tracker.feed(c))
}

/// Find the byte index of the delimiter closing the one at `open_at`.
///
/// `s[open_at..]` must start with `open`. Nested pairs of the same kind are
/// balanced, string literals are skipped.
pub fn find_matching(s: &str, open_at: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in unquoted_char_indices(&s[open_at..]) {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(open_at + i);
            }
        }
    }
    None
}

/// Identifier characters: Unicode letters, digits and `_`.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Length in bytes of the identifier run at the start of `s`.
pub fn ident_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_skips_quoted_delimiters() {
        let found: String = unquoted_char_indices(r#"a"}>"b'x\'y'c"#)
            .map(|(_, c)| c)
            .collect();
        assert_eq!(found, "abc");
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        let mut t = QuoteTracker::new();
        for c in r#""a\"b"#.chars() {
            t.feed(c);
        }
        assert!(t.in_quote());
        t.feed('"');
        assert!(!t.in_quote());
    }

    #[test]
    fn test_find_matching_nested() {
        let s = "a[b[c]][\"]\"]";
        assert_eq!(find_matching(s, 1, '[', ']'), Some(6));
        assert_eq!(find_matching(s, 7, '[', ']'), Some(11));
        assert_eq!(find_matching("f(x", 1, '(', ')'), None);
    }

    #[test]
    fn test_ident_len_unicode() {
        assert_eq!(ident_len("prénom.x"), "prénom".len());
        assert_eq!(ident_len(".x"), 0);
        assert_eq!(ident_len("abc"), 3);
    }
}
