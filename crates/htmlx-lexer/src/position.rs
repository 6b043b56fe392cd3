//! Source positions shared by tokens, AST nodes and errors.

use serde::Serialize;

/// A location in source text.
///
/// `line` and `column` are 1-based, `column` counts characters. `offset` is
/// the byte offset from the start of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Point {
    /// The first character of a document.
    pub const START: Point = Point {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Move back `n` single-byte characters on the same line.
    ///
    /// Used to drop an ASCII suffix such as `</script>` from a span.
    pub fn back(self, n: usize) -> Self {
        Self {
            line: self.line,
            column: self.column.saturating_sub(n).max(1),
            offset: self.offset.saturating_sub(n),
        }
    }

    /// The point just after `ch`, which is assumed to start at `self`.
    pub fn after_char(self, ch: char) -> Self {
        if ch == '\n' {
            Self::new(self.line + 1, 1, self.offset + 1)
        } else {
            Self::new(self.line, self.column + 1, self.offset + ch.len_utf8())
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::START
    }
}

/// A half-open range of source text: `end` is the point just after the last
/// covered character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// A zero-width range at `at`.
    pub fn empty(at: Point) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// The source text covered by this range.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start.offset..self.end.offset]
    }
}
