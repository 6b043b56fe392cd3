//! HTMLX Lexer
//!
//! Tokenizes HTMLX component templates into a stream of tokens.
//! Tracks a stack of lexer modes (content, tag, quoted value, raw text,
//! expression), scans embedded expressions with balanced braces, and records
//! every token's exact line, column and byte offset.
//!
//! # Example
//!
//! ```
//! use htmlx_lexer::{Scanner, TokenKind};
//!
//! let (tokens, errors) = Scanner::tokenize("<b>{name}</b>");
//! assert!(errors.is_empty());
//! assert_eq!(tokens[3].kind, TokenKind::ExprContent);
//! ```

pub mod expression;
pub mod mode;
pub mod position;
pub mod scanner;
pub mod token;

pub use expression::scan_expression;
pub use mode::Mode;
pub use position::{Point, Position};
pub use scanner::Scanner;
pub use token::{Token, TokenKind};

/// Lexer error with position information.
///
/// The position covers the first character the lexer could not match, or is
/// empty at the end of input when a mode was left open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Lexer error at line {}, column {}: {message}",
    .position.start.line,
    .position.start.column
)]
pub struct LexerError {
    pub message: String,
    pub position: Position,
}
