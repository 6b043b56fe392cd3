//! HTMLX Parser
//!
//! Parses HTMLX component templates into a positioned Abstract Syntax Tree.
//! The pipeline runs the `htmlx-lexer` scanner, builds a concrete syntax
//! tree with a recovering recursive descent parser, then transforms it into
//! the typed AST.
//!
//! Malformed input never aborts a parse: every lexer and parser problem is
//! returned as a [`ParseError`] next to a best-effort tree.
//!
//! # Example
//!
//! ```
//! use htmlx_parser::{parse, ast::Node};
//!
//! let result = parse("<ul><li>a<li>b</ul>");
//! assert!(result.errors.is_empty());
//! let Node::Element(list) = &result.ast.children[0] else { panic!() };
//! assert_eq!(list.children.len(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod ast;
pub mod cst;
pub mod parser;
pub mod tables;
pub mod transform;

pub use ast::{Node, Root};
pub use htmlx_lexer::{LexerError, Point, Position};
pub use parser::Parser;
pub use transform::transform;

/// Which pipeline stage reported an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorSource {
    Lexer,
    Parser,
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSource::Lexer => f.write_str("Lexer"),
            ErrorSource::Parser => f.write_str("Parser"),
        }
    }
}

/// A lexing or parsing problem, with the source range it concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error(
    "{origin} error at line {}, column {}: {message}",
    .position.start.line,
    .position.start.column
)]
pub struct ParseError {
    #[serde(rename = "source")]
    pub origin: ErrorSource,
    pub name: String,
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn parser(name: &str, message: impl Into<String>, position: Position) -> Self {
        Self {
            origin: ErrorSource::Parser,
            name: name.to_string(),
            message: message.into(),
            position,
        }
    }
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        Self {
            origin: ErrorSource::Lexer,
            name: "LexingError".to_string(),
            message: err.message,
            position: err.position,
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Drop trailing whitespace from the document before lexing. Positions
    /// of everything before the trimmed tail are unaffected.
    pub trim_trailing_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            trim_trailing_whitespace: true,
        }
    }
}

/// The outcome of a parse: always a tree, plus every error met on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub ast: Root,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a template with the default options.
pub fn parse(source: &str) -> ParseResult {
    parse_with_options(source, &ParseOptions::default())
}

/// Parse a template.
///
/// Lexer errors come first, then parser errors, each in source order.
pub fn parse_with_options(source: &str, options: &ParseOptions) -> ParseResult {
    let source = if options.trim_trailing_whitespace {
        source.trim_end()
    } else {
        source
    };

    let (tokens, lex_errors) = htmlx_lexer::Scanner::tokenize(source);
    let (cst, parse_errors) = Parser::parse(&tokens);
    let ast = transform(cst);

    let errors: Vec<ParseError> = lex_errors
        .into_iter()
        .map(ParseError::from)
        .chain(parse_errors)
        .collect();
    debug!(
        bytes = source.len(),
        nodes = ast.children.len(),
        errors = errors.len(),
        "parsed template"
    );

    ParseResult { ast, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document() {
        let result = parse("");
        assert!(result.is_ok());
        assert_eq!(result.ast.children, vec![]);
        assert_eq!(result.ast.position, Position::empty(Point::START));
    }

    #[test]
    fn test_whitespace_only_document_is_empty_when_trimmed() {
        let result = parse("  \n\t\n");
        assert!(result.is_ok());
        assert!(result.ast.children.is_empty());
    }

    #[test]
    fn test_trailing_whitespace_kept_when_configured() {
        let options = ParseOptions {
            trim_trailing_whitespace: false,
        };
        let result = parse_with_options("<p>a</p>\n", &options);
        assert!(result.is_ok());
        assert_eq!(result.ast.children.len(), 2);
        assert_eq!(result.ast.position.end, Point::new(2, 1, 9));
    }

    #[test]
    fn test_trailing_whitespace_trimmed_by_default() {
        let result = parse("<p>a</p>\n  ");
        assert_eq!(result.ast.children.len(), 1);
        assert_eq!(result.ast.position.end, Point::new(1, 9, 8));
    }

    #[test]
    fn test_unterminated_tag_reports_errors() {
        let result = parse("<h1");
        assert!(!result.errors.is_empty());
        assert!(result
            .errors
            .iter()
            .any(|e| e.origin == ErrorSource::Parser));
        assert_eq!(result.errors[0].origin, ErrorSource::Lexer);
    }

    #[test]
    fn test_lexer_errors_precede_parser_errors() {
        let result = parse("<div>a < b");
        let origins: Vec<_> = result.errors.iter().map(|e| e.origin).collect();
        assert_eq!(origins, vec![ErrorSource::Lexer, ErrorSource::Parser]);
        assert_eq!(result.errors[1].name, "MissingCloseTag");
    }

    #[test]
    fn test_deeply_nested_markup_returns_errors() {
        let result = parse(&"<div>".repeat(10_000));
        assert!(result
            .errors
            .iter()
            .any(|e| e.name == "NestingTooDeep"));
        assert_eq!(result.ast.children.len(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::parser(
            "MismatchedToken",
            "expected '>'",
            Position::empty(Point::new(3, 4, 20)),
        );
        assert_eq!(
            err.to_string(),
            "Parser error at line 3, column 4: expected '>'"
        );
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParseOptions::default());
        let options: ParseOptions =
            serde_json::from_str(r#"{"trimTrailingWhitespace": false}"#).unwrap();
        assert!(!options.trim_trailing_whitespace);
    }

    #[test]
    fn test_error_serializes_source_field() {
        let result = parse("a < b");
        let json = serde_json::to_value(&result.errors[0]).unwrap();
        assert_eq!(json["source"], "Lexer");
        assert_eq!(json["name"], "LexingError");
        assert_eq!(json["position"]["start"]["column"], 3);
    }
}
