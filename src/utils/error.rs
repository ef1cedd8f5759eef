//! Error handling for ftl2gotpl conversions
//!
//! Every stage of the pipeline reports failures as a single positioned
//! [`Diagnostic`]. The first diagnostic aborts the conversion of a document.

use std::fmt;

use ftl2gotpl_ast::Position;
use serde::{Deserialize, Serialize};

/// Stable diagnostic identifiers that callers may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lexical
    LexUnclosedComment,
    LexUnclosedInterpolation,
    LexUnclosedTag,
    LexInvalidDirective,
    LexInvalidMacroCall,
    // Structural
    ParseUnexpectedDirective,
    ParseUnexpectedClosing,
    ParseUnsupportedDirective,
    ParseInvalidIf,
    ParseInvalidElseif,
    ParseUnclosedIf,
    ParseInvalidList,
    ParseUnclosedList,
    ParseInvalidAssign,
    ParseInvalidFunction,
    ParseUnclosedFunction,
    // Emission
    EmitUnsupportedFunction,
    EmitUnsupportedMacroCall,
    EmitUnsupportedReturn,
    EmitExpressionMap,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LexUnclosedComment => "LEX_UNCLOSED_COMMENT",
            ErrorCode::LexUnclosedInterpolation => "LEX_UNCLOSED_INTERPOLATION",
            ErrorCode::LexUnclosedTag => "LEX_UNCLOSED_TAG",
            ErrorCode::LexInvalidDirective => "LEX_INVALID_DIRECTIVE",
            ErrorCode::LexInvalidMacroCall => "LEX_INVALID_MACRO_CALL",
            ErrorCode::ParseUnexpectedDirective => "PARSE_UNEXPECTED_DIRECTIVE",
            ErrorCode::ParseUnexpectedClosing => "PARSE_UNEXPECTED_CLOSING",
            ErrorCode::ParseUnsupportedDirective => "PARSE_UNSUPPORTED_DIRECTIVE",
            ErrorCode::ParseInvalidIf => "PARSE_INVALID_IF",
            ErrorCode::ParseInvalidElseif => "PARSE_INVALID_ELSEIF",
            ErrorCode::ParseUnclosedIf => "PARSE_UNCLOSED_IF",
            ErrorCode::ParseInvalidList => "PARSE_INVALID_LIST",
            ErrorCode::ParseUnclosedList => "PARSE_UNCLOSED_LIST",
            ErrorCode::ParseInvalidAssign => "PARSE_INVALID_ASSIGN",
            ErrorCode::ParseInvalidFunction => "PARSE_INVALID_FUNCTION",
            ErrorCode::ParseUnclosedFunction => "PARSE_UNCLOSED_FUNCTION",
            ErrorCode::EmitUnsupportedFunction => "EMIT_UNSUPPORTED_FUNCTION",
            ErrorCode::EmitUnsupportedMacroCall => "EMIT_UNSUPPORTED_MACRO_CALL",
            ErrorCode::EmitUnsupportedReturn => "EMIT_UNSUPPORTED_RETURN",
            ErrorCode::EmitExpressionMap => "EMIT_EXPRESSION_MAP",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured, positioned conversion error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub file: String,
    /// 1-based; 0 when the error has no meaningful source position.
    pub line: usize,
    pub column: usize,
    /// Offending source text (raw tag or expression), may be empty.
    pub snippet: String,
}

impl Diagnostic {
    pub fn new(
        code: ErrorCode,
        file: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            file: file.into(),
            line,
            column,
            snippet: String::new(),
        }
    }

    pub fn at(
        code: ErrorCode,
        file: impl Into<String>,
        pos: Position,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, file, pos.line, pos.column, message)
    }

    /// Attach the offending source text.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(
                f,
                "{}:{}:{} [{}]: {}",
                self.file, self.line, self.column, self.code, self.message
            )
        } else {
            write!(f, "{} [{}]: {}", self.file, self.code, self.message)
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, Diagnostic>;

/// Failure to rewrite a single expression.
///
/// Carries only a message; the emitter attaches file, position and the
/// expression text when it turns this into an `EMIT_EXPRESSION_MAP`
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
}

impl ExprError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn unsupported_identifier(expr: &str) -> Self {
        Self::new(format!("unsupported identifier expression {:?}", expr))
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExprError {}

pub type ExprResult<T> = Result<T, ExprError>;
