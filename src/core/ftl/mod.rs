//! FreeMarker front end: source text to [`Document`](ftl2gotpl_ast::Document).

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::{scan, Lexer};
pub use parser::{parse, Parser};
pub use token::{Token, TokenKind};
