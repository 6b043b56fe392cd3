use tracing::{debug, trace};

use crate::expression::scan_expression;
use crate::mode::{Mode, Transition};
use crate::position::{Point, Position};
use crate::token::{Token, TokenKind};
use crate::LexerError;

/// HTMLX source scanner.
///
/// Tokenizes a template into a flat token stream using a stack of lexer
/// modes:
/// - Byte-offset navigation over the borrowed source
/// - Explicit mode stack, never any global pattern state
/// - Longest match with priority among the current mode's candidates
/// - Unmatched characters are skipped and reported, never fatal
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    point: Point,
    modes: Vec<Mode>,
    tokens: Vec<Token>,
    errors: Vec<LexerError>,
    /// First offset from which no `-->` exists, once known.
    no_comment_end_from: Option<usize>,
}

/// An in-progress run of unmatched characters.
struct Skipped {
    start: Point,
    first: char,
    count: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            point: Point::START,
            modes: vec![Mode::Content],
            tokens: Vec::new(),
            errors: Vec::new(),
            no_comment_end_from: None,
        }
    }

    /// Tokenize the entire source.
    ///
    /// Always returns every token that could be matched together with one
    /// error per run of characters that could not.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexerError>) {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens();
        debug!(
            tokens = scanner.tokens.len(),
            errors = scanner.errors.len(),
            "tokenized"
        );
        (scanner.tokens, scanner.errors)
    }

    /// The mode on top of the stack.
    pub fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Content)
    }

    fn scan_tokens(&mut self) {
        let mut skipped: Option<Skipped> = None;

        while !self.is_at_end() {
            match self.longest_match() {
                Some((kind, end)) => {
                    if let Some(run) = skipped.take() {
                        self.report_skipped(run);
                    }
                    self.emit(kind, end);
                    self.apply(kind.transition());
                }
                None if self.mode().is_raw_content() => {
                    // No end tag anywhere ahead: nothing later can match either.
                    let run = self.skip_char(skipped.take());
                    let rest = self.source[self.pos..].chars().count();
                    self.advance_to(self.source.len());
                    skipped = Some(Skipped {
                        count: run.count + rest,
                        ..run
                    });
                }
                None => {
                    let run = self.skip_char(skipped.take());
                    skipped = Some(run);
                }
            }
        }

        if let Some(run) = skipped {
            self.report_skipped(run);
        }

        if self.modes.len() > 1 {
            let mode = self.mode();
            self.errors.push(LexerError {
                message: format!("unexpected end of input in {mode:?} mode"),
                position: Position::empty(self.point),
            });
        }
    }

    /// Try every candidate of the current mode at the current position.
    fn longest_match(&mut self) -> Option<(TokenKind, usize)> {
        let mut best: Option<(TokenKind, usize)> = None;
        for &kind in self.mode().candidates() {
            let Some(end) = self.match_kind(kind) else {
                continue;
            };
            match best {
                Some((_, best_end)) if end <= best_end => {}
                _ => best = Some((kind, end)),
            }
        }
        best
    }

    /// Match a single token rule at the current position, returning its end.
    fn match_kind(&mut self, kind: TokenKind) -> Option<usize> {
        let source = self.source;
        let rest = &source[self.pos..];
        let len = match kind {
            TokenKind::WhiteSpace => run_len(rest, char::is_whitespace),
            TokenKind::TextContent => run_len(rest, |c| c != '<' && c != '{'),
            TokenKind::CommentTag => return self.match_comment(),
            TokenKind::OpenTag => tag_opener_len(rest, "<"),
            TokenKind::CloseTag => tag_opener_len(rest, "</"),

            TokenKind::OpenScriptTag => raw_opener_len(rest, "script"),
            TokenKind::OpenStyleTag => raw_opener_len(rest, "style"),
            TokenKind::OpenTextAreaTag => raw_opener_len(rest, "textarea"),
            TokenKind::ScriptContentAndEndTag => content_and_end_len(rest, "</script>"),
            TokenKind::StyleContentAndEndTag => content_and_end_len(rest, "</style>"),
            TokenKind::TextAreaContentAndEndTag => content_and_end_len(rest, "</textarea>"),
            TokenKind::TextModeTagSelfClose => literal_len(rest, "/>"),

            TokenKind::RAngle
            | TokenKind::ScriptRAngle
            | TokenKind::StyleRAngle
            | TokenKind::TextAreaRAngle => literal_len(rest, ">"),
            TokenKind::Slash => literal_len(rest, "/"),
            TokenKind::Colon => literal_len(rest, ":"),
            TokenKind::Equal => literal_len(rest, "="),
            TokenKind::Pipe => literal_len(rest, "|"),
            TokenKind::AttrText => run_len(rest, is_attr_text_char),

            TokenKind::DQuote | TokenKind::DQuoteEnd => literal_len(rest, "\""),
            TokenKind::SQuote | TokenKind::SQuoteEnd => literal_len(rest, "'"),
            TokenKind::DQuotedString => quoted_string_len(rest, '"'),
            TokenKind::SQuotedString => quoted_string_len(rest, '\''),

            TokenKind::LCurly => literal_len(rest, "{"),
            TokenKind::RCurly => literal_len(rest, "}"),
            TokenKind::ExprContent => {
                return scan_expression(source, self.pos);
            }
            TokenKind::VoidBlock => sigil_len(rest, '@'),
            TokenKind::BranchBlockOpen => sigil_len(rest, '#'),
            TokenKind::BranchBlockContinue => sigil_len(rest, ':'),
            TokenKind::BranchBlockEnd => sigil_len(rest, '/'),
        };
        (len > 0).then_some(self.pos + len)
    }

    /// `<!--` through the first following `-->`.
    fn match_comment(&mut self) -> Option<usize> {
        if !self.source[self.pos..].starts_with("<!--") {
            return None;
        }
        let body = self.pos + 4;
        if self.no_comment_end_from.is_some_and(|from| body >= from) {
            return None;
        }
        match self.source[body..].find("-->") {
            Some(idx) => Some(body + idx + 3),
            None => {
                self.no_comment_end_from = Some(body);
                None
            }
        }
    }

    // --- Mode stack ---

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay => return,
            Transition::Push(mode) => self.modes.push(mode),
            Transition::Pop => self.pop_mode(),
            Transition::Replace(mode) => {
                self.pop_mode();
                self.modes.push(mode);
            }
        }
        trace!(mode = ?self.mode(), depth = self.modes.len(), "mode changed");
    }

    /// Pop the current mode, keeping the default mode at the bottom.
    fn pop_mode(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    // --- Tokens and errors ---

    fn emit(&mut self, kind: TokenKind, end: usize) {
        let start = self.point;
        let image = &self.source[self.pos..end];
        let last = self.advance_to(end);
        self.tokens.push(Token::new(kind, image, start, last));
    }

    /// Skip one unmatched character, extending `run` when it is adjacent.
    fn skip_char(&mut self, run: Option<Skipped>) -> Skipped {
        let start = self.point;
        let first = self.peek();
        self.advance_to(self.pos + first.len_utf8());
        match run {
            Some(run) => Skipped {
                count: run.count + 1,
                ..run
            },
            None => Skipped {
                start,
                first,
                count: 1,
            },
        }
    }

    fn report_skipped(&mut self, run: Skipped) {
        let Skipped {
            start,
            first,
            count,
        } = run;
        self.errors.push(LexerError {
            message: format!(
                "unexpected character: ->{first}<- at offset: {}, skipped {count} characters.",
                start.offset
            ),
            position: Position::new(start, start.after_char(first)),
        });
    }

    // --- Helpers ---

    /// Move to byte offset `end`, returning the point of the last character
    /// passed over.
    fn advance_to(&mut self, end: usize) -> Point {
        let mut last = self.point;
        for ch in self.source[self.pos..end].chars() {
            last = self.point;
            self.point = self.point.after_char(ch);
        }
        self.pos = end;
        last
    }

    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

// --- Token rules ---

/// Length in bytes of the leading run of characters satisfying `pred`.
fn run_len(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.find(|c: char| !pred(c)).unwrap_or(text.len())
}

fn literal_len(text: &str, literal: &str) -> usize {
    if text.starts_with(literal) {
        literal.len()
    } else {
        0
    }
}

fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ':' || c == '-'
}

fn is_attr_text_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '=' | '<' | '>' | '`' | '{' | '|' | '/')
}

/// `<name` or `</name`.
fn tag_opener_len(text: &str, prefix: &str) -> usize {
    match text.strip_prefix(prefix) {
        Some(rest) => match run_len(rest, is_tag_name_char) {
            0 => 0,
            name => prefix.len() + name,
        },
        None => 0,
    }
}

/// `<script`, `<style`, `<textarea`: lowercase first letter, the rest in any
/// ASCII case.
fn raw_opener_len(text: &str, name: &str) -> usize {
    let bytes = text.as_bytes();
    let len = name.len() + 1;
    if bytes.len() < len || bytes[0] != b'<' || bytes[1] != name.as_bytes()[0] {
        return 0;
    }
    if bytes[2..len].eq_ignore_ascii_case(&name.as_bytes()[1..]) {
        len
    } else {
        0
    }
}

/// Everything up to and including the first ASCII-case-insensitive `end_tag`.
fn content_and_end_len(text: &str, end_tag: &str) -> usize {
    let needle = end_tag.as_bytes();
    text.as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map_or(0, |idx| idx + needle.len())
}

/// String content inside a quoted attribute value: stops at the closing quote
/// or at `{`, treating a backslash-escaped quote as content.
fn quoted_string_len(text: &str, quote: char) -> usize {
    let mut chars = text.char_indices().peekable();
    let mut len = 0;
    while let Some((idx, c)) = chars.next() {
        if c == '\\' && chars.peek().is_some_and(|(_, next)| *next == quote) {
            chars.next();
            len = idx + 2;
        } else if c == quote || c == '{' {
            break;
        } else {
            len = idx + c.len_utf8();
        }
    }
    len
}

/// A block sigil followed by at least one character that is neither
/// whitespace nor `}`.
fn sigil_len(text: &str, sigil: char) -> usize {
    match text.strip_prefix(sigil) {
        Some(rest) => match run_len(rest, |c| !c.is_whitespace() && c != '}') {
            0 => 0,
            name => sigil.len_utf8() + name,
        },
        None => 0,
    }
}
