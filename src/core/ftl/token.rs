//! FreeMarker token definitions.
//!
//! The scanner reduces a template to a flat sequence of four token kinds.
//! Tag arguments stay unparsed: the parser and the expression rewriter
//! interpret them.

use std::fmt;

use ftl2gotpl_ast::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text run.
    Text(String),

    /// `${expr}` or `#{expr}`; the expression is trimmed.
    Interpolation { expr: String, alt_style: bool },

    /// `<#name args>` or `</#name>`.
    /// The name is lowercased, the arguments are verbatim (trimmed).
    Directive {
        name: String,
        args: String,
        closing: bool,
    },

    /// `<@name args>`.
    MacroCall { name: String, args: String },
}

/// One lexical unit with its starting position and raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
    pub raw: String,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position, raw: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            raw: raw.into(),
        }
    }

    /// Returns true for a closing directive tag with the given name
    pub fn is_closing(&self, expected: &str) -> bool {
        matches!(&self.kind, TokenKind::Directive { name, closing: true, .. } if name == expected)
    }

    /// Returns true for an opening directive tag with the given name
    pub fn is_opening(&self, expected: &str) -> bool {
        matches!(&self.kind, TokenKind::Directive { name, closing: false, .. } if name == expected)
    }

    /// Directive name, if this is a directive token
    pub fn directive_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Directive { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Directive arguments, or an empty string for other kinds
    pub fn args(&self) -> &str {
        match &self.kind {
            TokenKind::Directive { args, .. } | TokenKind::MacroCall { args, .. } => args,
            _ => "",
        }
    }

    /// Key used for stopper-set lookups: `dir:<name>` or `close:<name>`.
    pub fn directive_key(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Directive {
                name,
                closing: true,
                ..
            } => Some(format!("close:{}", name)),
            TokenKind::Directive { name, .. } => Some(format!("dir:{}", name)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(name: &str, closing: bool) -> Token {
        Token::new(
            TokenKind::Directive {
                name: name.into(),
                args: String::new(),
                closing,
            },
            Position::default(),
            if closing {
                format!("</#{}>", name)
            } else {
                format!("<#{}>", name)
            },
        )
    }

    #[test]
    fn test_directive_keys() {
        assert_eq!(directive("if", false).directive_key().as_deref(), Some("dir:if"));
        assert_eq!(
            directive("list", true).directive_key().as_deref(),
            Some("close:list")
        );
        let text = Token::new(TokenKind::Text("x".into()), Position::default(), "x");
        assert_eq!(text.directive_key(), None);
    }

    #[test]
    fn test_open_close_predicates() {
        let tok = directive("if", true);
        assert!(tok.is_closing("if"));
        assert!(!tok.is_opening("if"));
        assert!(!tok.is_closing("list"));
        assert_eq!(tok.to_string(), "</#if>");
    }
}
