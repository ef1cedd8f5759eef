//! FreeMarker Lexer/Tokenizer
//!
//! Converts template source into a flat stream of [`Token`]s:
//! - `<#-- ... -->` comments are skipped
//! - `${...}` / `#{...}` interpolations honor nested braces and string literals
//! - `<#...>`, `</#...>` and `<@...>` tags run to the first `>` outside
//!   string literals and parentheses
//! - everything else is literal text
//!
//! Positions are 1-based and advance per character; `\n` starts a new line.

use ftl2gotpl_ast::Position;

use super::token::{Token, TokenKind};
use crate::core::quote::QuoteTracker;
use crate::utils::error::{ConvertResult, Diagnostic, ErrorCode};

const COMMENT_OPEN: &str = "<#--";
const COMMENT_CLOSE: &str = "-->";

/// Streaming scanner over one template source string.
pub struct Lexer<'a> {
    src: &'a str,
    file: &'a str,
    index: usize,
    line: usize,
    column: usize,
    /// Set after the first error so iteration stops.
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(file: &'a str, src: &'a str) -> Self {
        Lexer {
            src,
            file,
            index: 0,
            line: 1,
            column: 1,
            done: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.index..]
    }

    fn eof(&self) -> bool {
        self.index >= self.src.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Consume and return the next character, updating line/column.
    fn next_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume characters until `target` (a byte index on a char boundary).
    fn advance_to(&mut self, target: usize) {
        while self.index < target {
            if self.next_char().is_none() {
                break;
            }
        }
    }

    fn at_interpolation(&self) -> bool {
        self.starts_with("${") || self.starts_with("#{")
    }

    fn at_tag(&self) -> bool {
        self.starts_with("<#") || self.starts_with("</#") || self.starts_with("<@")
    }

    fn error(&self, code: ErrorCode, pos: Position, message: &str) -> Diagnostic {
        Diagnostic::at(code, self.file, pos, message)
    }

    /// Literal text up to the next recognized construct.
    fn consume_text(&mut self) -> Token {
        let pos = self.pos();
        let start = self.index;
        while !self.eof() && !self.at_interpolation() && !self.at_tag() {
            self.next_char();
        }
        let text = &self.src[start..self.index];
        Token::new(TokenKind::Text(text.to_string()), pos, text)
    }

    fn consume_comment(&mut self) -> ConvertResult<()> {
        let pos = self.pos();
        let body_start = self.index + COMMENT_OPEN.len();
        match self.src[body_start..].find(COMMENT_CLOSE) {
            Some(offset) => {
                self.advance_to(body_start + offset + COMMENT_CLOSE.len());
                Ok(())
            }
            None => Err(self.error(
                ErrorCode::LexUnclosedComment,
                pos,
                "unclosed FreeMarker comment",
            )),
        }
    }

    fn consume_interpolation(&mut self) -> ConvertResult<Token> {
        let pos = self.pos();
        let start = self.index;
        let alt_style = self.starts_with("#{");

        // opener
        self.next_char();
        self.next_char();

        let mut depth = 1usize;
        let mut quotes = QuoteTracker::new();
        while let Some(c) = self.next_char() {
            if quotes.feed(c) {
                continue;
            }
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let raw = &self.src[start..self.index];
                        let expr = raw[2..raw.len() - 1].trim().to_string();
                        return Ok(Token::new(
                            TokenKind::Interpolation { expr, alt_style },
                            pos,
                            raw,
                        ));
                    }
                }
                _ => {}
            }
        }

        Err(self.error(
            ErrorCode::LexUnclosedInterpolation,
            pos,
            "unclosed interpolation",
        ))
    }

    fn consume_tag(&mut self) -> ConvertResult<Token> {
        let pos = self.pos();
        let start = self.index;
        let mut quotes = QuoteTracker::new();
        let mut parens = 0usize;

        while let Some(c) = self.next_char() {
            if quotes.feed(c) {
                continue;
            }
            match c {
                '(' => parens += 1,
                ')' => parens = parens.saturating_sub(1),
                '>' if parens == 0 => {
                    let raw = &self.src[start..self.index];
                    return parse_tag(raw, pos, self.file);
                }
                _ => {}
            }
        }

        Err(self.error(ErrorCode::LexUnclosedTag, pos, "unclosed tag"))
    }

    /// Read the next token, skipping comments.
    fn next_token(&mut self) -> Option<ConvertResult<Token>> {
        loop {
            if self.eof() {
                return None;
            }
            if self.starts_with(COMMENT_OPEN) {
                if let Err(e) = self.consume_comment() {
                    return Some(Err(e));
                }
                continue;
            }
            if self.at_interpolation() {
                return Some(self.consume_interpolation());
            }
            if self.at_tag() {
                return Some(self.consume_tag());
            }
            return Some(Ok(self.consume_text()));
        }
    }

    /// Tokenize the entire input, stopping at the first error.
    pub fn tokenize(self) -> ConvertResult<Vec<Token>> {
        self.collect()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = ConvertResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_)) | None) {
            self.done = true;
        }
        item
    }
}

/// Tokenize one template source.
pub fn scan(file: &str, src: &str) -> ConvertResult<Vec<Token>> {
    let tokens = Lexer::new(file, src).tokenize()?;
    log::debug!("{}: scanned {} tokens", file, tokens.len());
    Ok(tokens)
}

/// Split a tag body into its name (first whitespace-delimited run) and the
/// trimmed remainder.
fn split_name_args(body: &str) -> (&str, &str) {
    let body = body.trim();
    match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim()),
        None => (body, ""),
    }
}

/// Strip the `<`, `>` and an optional self-closing `/` from a tag.
fn tag_body<'r>(raw: &'r str, opener: &str) -> &'r str {
    let inner = raw.strip_prefix(opener).unwrap_or(raw);
    let inner = inner.strip_suffix('>').unwrap_or(inner).trim_end();
    inner.strip_suffix('/').unwrap_or(inner).trim()
}

/// Interpret a raw tag into a directive or macro-call token.
fn parse_tag(raw: &str, pos: Position, file: &str) -> ConvertResult<Token> {
    if raw.starts_with("<@") {
        let (name, args) = split_name_args(tag_body(raw, "<@"));
        if name.is_empty() {
            return Err(
                Diagnostic::at(ErrorCode::LexInvalidMacroCall, file, pos, "invalid macro call")
                    .with_snippet(raw),
            );
        }
        return Ok(Token::new(
            TokenKind::MacroCall {
                name: name.to_string(),
                args: args.to_string(),
            },
            pos,
            raw,
        ));
    }

    let mut body = tag_body(raw, "<");
    let closing = body.starts_with('/');
    if closing {
        body = body[1..].trim_start();
    }
    body = body.strip_prefix('#').unwrap_or(body).trim_start();

    let (name, args) = split_name_args(body);
    if name.is_empty() {
        return Err(
            Diagnostic::at(ErrorCode::LexInvalidDirective, file, pos, "invalid directive tag")
                .with_snippet(raw),
        );
    }

    Ok(Token::new(
        TokenKind::Directive {
            name: name.to_lowercase(),
            args: args.to_string(),
            closing,
        },
        pos,
        raw,
    ))
}
