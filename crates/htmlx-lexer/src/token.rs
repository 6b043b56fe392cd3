use std::fmt;

use serde::Serialize;

use crate::position::{Point, Position};

/// Token classification for HTMLX source.
///
/// Every kind carries its text in [`Token::image`]; the kind only says which
/// rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    WhiteSpace,

    // Content
    TextContent,
    CommentTag,
    OpenTag,
    CloseTag,

    // Raw-text elements
    OpenScriptTag,
    ScriptRAngle,
    ScriptContentAndEndTag,
    OpenStyleTag,
    StyleRAngle,
    StyleContentAndEndTag,
    OpenTextAreaTag,
    TextAreaRAngle,
    TextAreaContentAndEndTag,
    TextModeTagSelfClose,

    // Inside a tag
    Slash,
    Colon,
    Equal,
    Pipe,
    RAngle,
    AttrText,

    // Quoted attribute values
    DQuote,
    DQuotedString,
    DQuoteEnd,
    SQuote,
    SQuotedString,
    SQuoteEnd,

    // Expressions and blocks
    LCurly,
    RCurly,
    ExprContent,
    /// `@name`
    VoidBlock,
    /// `#name`
    BranchBlockOpen,
    /// `:name`
    BranchBlockContinue,
    /// `/name`
    BranchBlockEnd,
}

impl TokenKind {
    /// Human readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::WhiteSpace => "whitespace",
            TokenKind::TextContent => "text",
            TokenKind::CommentTag => "comment",
            TokenKind::OpenTag => "open tag",
            TokenKind::CloseTag => "close tag",
            TokenKind::OpenScriptTag => "'<script'",
            TokenKind::OpenStyleTag => "'<style'",
            TokenKind::OpenTextAreaTag => "'<textarea'",
            TokenKind::ScriptRAngle
            | TokenKind::StyleRAngle
            | TokenKind::TextAreaRAngle
            | TokenKind::RAngle => "'>'",
            TokenKind::ScriptContentAndEndTag => "script content and '</script>'",
            TokenKind::StyleContentAndEndTag => "style content and '</style>'",
            TokenKind::TextAreaContentAndEndTag => "textarea content and '</textarea>'",
            TokenKind::TextModeTagSelfClose => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Colon => "':'",
            TokenKind::Equal => "'='",
            TokenKind::Pipe => "'|'",
            TokenKind::AttrText => "attribute text",
            TokenKind::DQuote | TokenKind::DQuoteEnd => "'\"'",
            TokenKind::SQuote | TokenKind::SQuoteEnd => "\"'\"",
            TokenKind::DQuotedString | TokenKind::SQuotedString => "string content",
            TokenKind::LCurly => "'{'",
            TokenKind::RCurly => "'}'",
            TokenKind::ExprContent => "expression",
            TokenKind::VoidBlock => "'@' block",
            TokenKind::BranchBlockOpen => "'#' block",
            TokenKind::BranchBlockContinue => "':' branch",
            TokenKind::BranchBlockEnd => "'/' block end",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token produced by the HTMLX lexer.
///
/// `end` is the point of the token's last character, so a token always covers
/// `start..=end`. Use [`Token::after`] for the exclusive end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    pub start: Point,
    pub end: Point,
}

impl Token {
    pub fn new(kind: TokenKind, image: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            kind,
            image: image.into(),
            start,
            end,
        }
    }

    /// The point just after the token: one column past its last character,
    /// or column 1 of the next line when that character is a newline.
    pub fn after(&self) -> Point {
        match self.image.chars().next_back() {
            Some(last) => self.end.after_char(last),
            None => self.start,
        }
    }

    /// The full range covered by the token.
    pub fn position(&self) -> Position {
        Position::new(self.start, self.after())
    }

    /// The element name of an open or close tag token (`<div` / `</div`),
    /// exactly as written.
    pub fn tag_name(&self) -> &str {
        self.image
            .trim_start_matches('<')
            .trim_start_matches('/')
    }

    /// The name after the sigil of a block token (`#if` -> `if`).
    pub fn block_name(&self) -> &str {
        let mut chars = self.image.chars();
        chars.next();
        chars.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, image: &str, start: Point, end: Point) -> Token {
        Token::new(kind, image, start, end)
    }

    #[test]
    fn test_after_single_line() {
        let tok = token(
            TokenKind::TextContent,
            "abc",
            Point::new(1, 1, 0),
            Point::new(1, 3, 2),
        );
        assert_eq!(tok.after(), Point::new(1, 4, 3));
    }

    #[test]
    fn test_after_trailing_newline() {
        let tok = token(
            TokenKind::TextContent,
            "ab\n",
            Point::new(1, 1, 0),
            Point::new(1, 3, 2),
        );
        assert_eq!(tok.after(), Point::new(2, 1, 3));
    }

    #[test]
    fn test_tag_names() {
        let open = token(TokenKind::OpenTag, "<svelte:head", Point::START, Point::START);
        let close = token(TokenKind::CloseTag, "</Nested", Point::START, Point::START);
        assert_eq!(open.tag_name(), "svelte:head");
        assert_eq!(close.tag_name(), "Nested");
    }

    #[test]
    fn test_block_name_strips_sigil() {
        let tok = token(TokenKind::BranchBlockOpen, "#each", Point::START, Point::START);
        assert_eq!(tok.block_name(), "each");
    }
}
