//! Template parser for HTMLX.
//!
//! Parses the token stream from `htmlx-lexer` into a concrete syntax tree.
//! Every grammar rule is one method returning an owned CST node. Choices are
//! made with at most two tokens of lookahead plus the void-element and
//! auto-stop tables; there is no backtracking.
//!
//! Error recovery is a bounded skip loop: a rule that meets an unexpected
//! token returns a [`Mismatch`], and the nearest enclosing child loop records
//! it and skips forward to a token that can start content again.

use htmlx_lexer::{Point, Position, Token, TokenKind};
use tracing::{debug, trace};

use crate::cst::{
    Attribute, AttributeItem, AttributeList, AttributeOrExpression, AttributeValue, BlockEnd,
    Branch, BranchBlock, CloseTag, Expression, Modifier, QuotedValue, RawBody, RawTag, Root, Tag,
    TagBody, TagChild, TagContent, ValuePart, VoidBlock,
};
use crate::tables::{auto_stop_tags, is_void_element};
use crate::ParseError;

/// A rule failed at the token with index `at` (or at end of input).
#[derive(Debug)]
struct Mismatch {
    name: &'static str,
    message: String,
    at: usize,
}

type PResult<T> = Result<T, Mismatch>;

/// Deepest element or block nesting parsed as a tree. Anything deeper is
/// reported and its children are parsed as siblings.
pub const MAX_NESTING: usize = 128;

/// HTMLX template parser.
///
/// Borrows the token stream for the duration of one parse and owns the
/// errors it collects. A fresh parser is built for every call.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Lowercased names of the elements currently open, innermost last.
    open_elements: Vec<String>,
    /// Open elements plus open branches.
    depth: usize,
    errors: Vec<ParseError>,
}

impl<'t> Parser<'t> {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            open_elements: Vec::new(),
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a token stream into a CST plus the errors met while parsing.
    pub fn parse(tokens: &'t [Token]) -> (Root<'t>, Vec<ParseError>) {
        let mut parser = Parser::new(tokens);
        let root = parser.root();
        debug!(
            tokens = tokens.len(),
            errors = parser.errors.len(),
            "parsed token stream"
        );
        (root, parser.errors)
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// `root := tag_content`, resuming after tokens that cannot start content.
    fn root(&mut self) -> Root<'t> {
        let mut content = TagContent::default();
        loop {
            self.tag_content_into(&mut content, None);
            let Some(token) = self.peek() else {
                break;
            };
            let first = self.pos;
            self.pos += 1;
            self.skip_to_sync();
            self.report(
                "UnexpectedToken",
                format!("unexpected {} '{}'", token.kind, token.image),
                first,
                self.pos,
            );
        }
        Root { content }
    }

    /// `tag_content := tag_child*`
    fn tag_content(&mut self, stop_tags: Option<&[&str]>) -> TagContent<'t> {
        let mut content = TagContent::default();
        self.tag_content_into(&mut content, stop_tags);
        content
    }

    fn tag_content_into(&mut self, content: &mut TagContent<'t>, stop_tags: Option<&[&str]>) {
        while self.at_child_start(stop_tags) {
            match self.tag_child() {
                Ok(child) => content.children.push(child),
                Err(mismatch) => self.recover(mismatch),
            }
        }
    }

    /// Whether the next tokens begin a child of the current content.
    fn at_child_start(&self, stop_tags: Option<&[&str]>) -> bool {
        match self.peek_kind() {
            Some(
                TokenKind::TextContent
                | TokenKind::CommentTag
                | TokenKind::OpenScriptTag
                | TokenKind::OpenStyleTag
                | TokenKind::OpenTextAreaTag,
            ) => true,
            Some(TokenKind::OpenTag) => match (stop_tags, self.peek()) {
                (Some(stops), Some(token)) => {
                    let name = token.tag_name().to_ascii_lowercase();
                    !stops.contains(&name.as_str())
                }
                _ => true,
            },
            // `{:else}` and `{/if}` end the content of the current branch.
            Some(TokenKind::LCurly) => !matches!(
                self.peek_nth_kind(1),
                Some(TokenKind::BranchBlockContinue | TokenKind::BranchBlockEnd)
            ),
            _ => false,
        }
    }

    /// `tag_child := tag | script_tag | style_tag | textarea_tag | comment_tag
    ///             | void_block | branch_block | expression | text`
    fn tag_child(&mut self) -> PResult<TagChild<'t>> {
        match self.peek_kind() {
            Some(TokenKind::OpenTag) => Ok(TagChild::Tag(self.tag()?)),
            Some(TokenKind::OpenScriptTag) => Ok(TagChild::Script(self.raw_tag(
                TokenKind::OpenScriptTag,
                TokenKind::ScriptRAngle,
                TokenKind::ScriptContentAndEndTag,
            )?)),
            Some(TokenKind::OpenStyleTag) => Ok(TagChild::Style(self.raw_tag(
                TokenKind::OpenStyleTag,
                TokenKind::StyleRAngle,
                TokenKind::StyleContentAndEndTag,
            )?)),
            Some(TokenKind::OpenTextAreaTag) => Ok(TagChild::TextArea(self.raw_tag(
                TokenKind::OpenTextAreaTag,
                TokenKind::TextAreaRAngle,
                TokenKind::TextAreaContentAndEndTag,
            )?)),
            Some(TokenKind::CommentTag) => Ok(TagChild::Comment(self.expect(TokenKind::CommentTag)?)),
            Some(TokenKind::TextContent) => Ok(TagChild::Text(self.expect(TokenKind::TextContent)?)),
            Some(TokenKind::LCurly) => match self.peek_nth_kind(1) {
                Some(TokenKind::VoidBlock) => Ok(TagChild::VoidBlock(self.void_block()?)),
                Some(TokenKind::BranchBlockOpen) => {
                    Ok(TagChild::BranchBlock(self.branch_block()?))
                }
                _ => Ok(TagChild::Expression(self.expression()?)),
            },
            _ => Err(self.mismatch_with("NoViableAlternative", "tag content")),
        }
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Parse an element, component or meta tag:
    /// ```text
    /// <name attributes />
    /// <void attributes>
    /// <name attributes> content </name>
    /// <li attributes> content (</li>)?
    /// ```
    fn tag(&mut self) -> PResult<Box<Tag<'t>>> {
        let open = self.expect(TokenKind::OpenTag)?;
        let name = open.tag_name().to_ascii_lowercase();

        let attributes = self.attribute_list()?;
        let whitespace = self.eat(TokenKind::WhiteSpace);

        let body = match self.peek_kind() {
            Some(TokenKind::Slash) => TagBody::SelfClose {
                slash: self.expect(TokenKind::Slash)?,
                r_angle: self.expect(TokenKind::RAngle)?,
            },
            Some(TokenKind::RAngle) if is_void_element(&name) => TagBody::Void {
                r_angle: self.expect(TokenKind::RAngle)?,
            },
            Some(TokenKind::RAngle) if self.depth >= MAX_NESTING => {
                let r_angle = self.expect(TokenKind::RAngle)?;
                self.nesting_too_deep(open, r_angle);
                TagBody::Content {
                    r_angle,
                    content: TagContent::default(),
                    close: None,
                }
            }
            Some(TokenKind::RAngle) => {
                let r_angle = self.expect(TokenKind::RAngle)?;
                self.open_elements.push(name.clone());
                self.depth += 1;
                let (content, close) = self.element_content(&name, auto_stop_tags(&name));
                self.depth -= 1;
                self.open_elements.pop();
                TagBody::Content {
                    r_angle,
                    content,
                    close,
                }
            }
            _ => return Err(self.mismatch("'>' or '/>'")),
        };

        Ok(Box::new(Tag {
            open,
            attributes,
            whitespace,
            body,
        }))
    }

    /// Children of an open element and its close tag, if one belongs to it.
    ///
    /// Elements with an auto-stop entry end silently before a stop sibling or
    /// a foreign close tag. Other elements require `</name>`; a close tag for
    /// an enclosing element is left for that element, and a close tag for
    /// nothing open is reported and dropped.
    fn element_content(
        &mut self,
        name: &str,
        stop_tags: Option<&'static [&'static str]>,
    ) -> (TagContent<'t>, Option<CloseTag<'t>>) {
        let mut content = TagContent::default();

        loop {
            self.tag_content_into(&mut content, stop_tags);

            let close_name = match self.peek() {
                Some(token) if token.kind == TokenKind::CloseTag => {
                    token.tag_name().to_ascii_lowercase()
                }
                _ => {
                    if stop_tags.is_none() {
                        self.missing_close_tag(name);
                    }
                    return (content, None);
                }
            };

            if close_name == name {
                return match self.close_tag() {
                    Ok(close) => (content, Some(close)),
                    Err(mismatch) => {
                        self.recover(mismatch);
                        (content, None)
                    }
                };
            }
            if stop_tags.is_some() {
                return (content, None);
            }
            if self.is_open_ancestor(&close_name) {
                self.missing_close_tag(name);
                return (content, None);
            }

            let first = self.pos;
            if let Err(mismatch) = self.close_tag() {
                self.recover(mismatch);
                continue;
            }
            self.report(
                "UnexpectedCloseTag",
                format!("unexpected </{close_name}> inside <{name}>"),
                first,
                self.pos,
            );
        }
    }

    /// `closetag := CloseTag WhiteSpace? RAngle`
    fn close_tag(&mut self) -> PResult<CloseTag<'t>> {
        Ok(CloseTag {
            open: self.expect(TokenKind::CloseTag)?,
            whitespace: self.eat(TokenKind::WhiteSpace),
            r_angle: self.expect(TokenKind::RAngle)?,
        })
    }

    /// `<script>`, `<style>` or `<textarea>`: attributes, then either `/>` or
    /// `>` followed by the raw content and end tag as one token.
    fn raw_tag(
        &mut self,
        opener: TokenKind,
        r_angle: TokenKind,
        content: TokenKind,
    ) -> PResult<RawTag<'t>> {
        let open = self.expect(opener)?;
        let attributes = self.attribute_list()?;
        let whitespace = self.eat(TokenKind::WhiteSpace);

        let body = match self.peek_kind() {
            Some(TokenKind::TextModeTagSelfClose) => {
                RawBody::SelfClose(self.expect(TokenKind::TextModeTagSelfClose)?)
            }
            Some(kind) if kind == r_angle => RawBody::Content {
                r_angle: self.expect(r_angle)?,
                content: self.expect(content)?,
            },
            _ => return Err(self.mismatch("'>' or '/>'")),
        };

        Ok(RawTag {
            open,
            attributes,
            whitespace,
            body,
        })
    }

    // =========================================================================
    // Blocks and expressions
    // =========================================================================

    /// `void_block := { @name WhiteSpace? ExprContent? }`
    fn void_block(&mut self) -> PResult<VoidBlock<'t>> {
        Ok(VoidBlock {
            l_curly: self.expect(TokenKind::LCurly)?,
            name: self.expect(TokenKind::VoidBlock)?,
            whitespace: self.eat(TokenKind::WhiteSpace),
            expression: self.eat(TokenKind::ExprContent),
            r_curly: self.expect(TokenKind::RCurly)?,
        })
    }

    /// `branch_block := start_branch branch* { /name WhiteSpace? }`
    ///
    /// Once the start branch is parsed the block is always kept: a broken
    /// continuation or end marker is recorded and ends the block there.
    fn branch_block(&mut self) -> PResult<Box<BranchBlock<'t>>> {
        let start = self.branch(TokenKind::BranchBlockOpen)?;
        let mut block = Box::new(BranchBlock {
            start,
            branches: Vec::new(),
            end: None,
        });

        while self.peek_kind() == Some(TokenKind::LCurly)
            && self.peek_nth_kind(1) == Some(TokenKind::BranchBlockContinue)
        {
            match self.branch(TokenKind::BranchBlockContinue) {
                Ok(branch) => block.branches.push(branch),
                Err(mismatch) => {
                    self.recover(mismatch);
                    return Ok(block);
                }
            }
        }

        let opened = block.start.sigil.block_name();
        if self.peek_kind() == Some(TokenKind::LCurly)
            && self.peek_nth_kind(1) == Some(TokenKind::BranchBlockEnd)
        {
            match self.block_end() {
                Ok(end) => {
                    let closed = end.sigil.block_name();
                    if opened != closed {
                        self.errors.push(ParseError::parser(
                            "MismatchedBlockEnd",
                            format!("expected {{/{opened}}} but found {{/{closed}}}"),
                            end.sigil.position(),
                        ));
                    }
                    block.end = Some(end);
                }
                Err(mismatch) => self.recover(mismatch),
            }
        } else {
            let message = format!("expected {{/{opened}}} but found {}", self.found());
            self.report_here("MissingBlockEnd", message);
        }

        Ok(block)
    }

    /// `{ /name WhiteSpace? }`
    fn block_end(&mut self) -> PResult<BlockEnd<'t>> {
        Ok(BlockEnd {
            l_curly: self.expect(TokenKind::LCurly)?,
            sigil: self.expect(TokenKind::BranchBlockEnd)?,
            whitespace: self.eat(TokenKind::WhiteSpace),
            r_curly: self.expect(TokenKind::RCurly)?,
        })
    }

    /// `start_branch | branch := { sigil WhiteSpace? ExprContent? } tag_content`
    fn branch(&mut self, sigil: TokenKind) -> PResult<Branch<'t>> {
        let l_curly = self.expect(TokenKind::LCurly)?;
        let sigil = self.expect(sigil)?;
        let whitespace = self.eat(TokenKind::WhiteSpace);
        let expression = self.eat(TokenKind::ExprContent);
        let r_curly = self.expect(TokenKind::RCurly)?;

        let content = if self.depth >= MAX_NESTING {
            self.nesting_too_deep(l_curly, r_curly);
            TagContent::default()
        } else {
            self.depth += 1;
            let content = self.tag_content(None);
            self.depth -= 1;
            content
        };

        Ok(Branch {
            l_curly,
            sigil,
            whitespace,
            expression,
            r_curly,
            content,
        })
    }

    /// `expression := { WhiteSpace? ExprContent }`
    fn expression(&mut self) -> PResult<Expression<'t>> {
        Ok(Expression {
            l_curly: self.expect(TokenKind::LCurly)?,
            whitespace: self.eat(TokenKind::WhiteSpace),
            content: self.expect(TokenKind::ExprContent)?,
            r_curly: self.expect(TokenKind::RCurly)?,
        })
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// `attribute_list := (WhiteSpace? (attribute | expression))*`
    ///
    /// Whitespace is only taken when an attribute follows, so a trailing
    /// `<a b />` leaves it for the tag.
    fn attribute_list(&mut self) -> PResult<AttributeList<'t>> {
        let mut items = Vec::new();

        loop {
            let whitespace = match (self.peek_kind(), self.peek_nth_kind(1)) {
                (Some(TokenKind::WhiteSpace), Some(TokenKind::AttrText | TokenKind::LCurly)) => {
                    self.eat(TokenKind::WhiteSpace)
                }
                (Some(TokenKind::AttrText | TokenKind::LCurly), _) => None,
                _ => break,
            };

            let attribute = match self.peek_kind() {
                Some(TokenKind::AttrText) => AttributeOrExpression::Attribute(self.attribute()?),
                _ => AttributeOrExpression::Expression(self.expression()?),
            };
            items.push(AttributeItem {
                whitespace,
                attribute,
            });
        }

        Ok(AttributeList { items })
    }

    /// `attribute := AttrText (Pipe AttrText)* (Equal value)?`
    fn attribute(&mut self) -> PResult<Attribute<'t>> {
        let name = self.expect(TokenKind::AttrText)?;

        let mut modifiers = Vec::new();
        while self.peek_kind() == Some(TokenKind::Pipe) {
            modifiers.push(Modifier {
                pipe: self.expect(TokenKind::Pipe)?,
                name: self.expect(TokenKind::AttrText)?,
            });
        }

        let value = match self.eat(TokenKind::Equal) {
            Some(equal) => Some(AttributeValue {
                equal,
                value: self.attribute_value()?,
            }),
            None => None,
        };

        Ok(Attribute {
            name,
            modifiers,
            value,
        })
    }

    /// A double-quoted, single-quoted or unquoted value.
    fn attribute_value(&mut self) -> PResult<QuotedValue<'t>> {
        match self.peek_kind() {
            Some(TokenKind::DQuote) => {
                let open = self.expect(TokenKind::DQuote)?;
                let parts = self.quoted_parts(TokenKind::DQuotedString)?;
                let close = self.expect(TokenKind::DQuoteEnd)?;
                Ok(QuotedValue::Double { open, parts, close })
            }
            Some(TokenKind::SQuote) => {
                let open = self.expect(TokenKind::SQuote)?;
                let parts = self.quoted_parts(TokenKind::SQuotedString)?;
                let close = self.expect(TokenKind::SQuoteEnd)?;
                Ok(QuotedValue::Single { open, parts, close })
            }
            _ => Ok(QuotedValue::Unquoted {
                parts: self.unquoted_parts()?,
            }),
        }
    }

    fn quoted_parts(&mut self, string: TokenKind) -> PResult<Vec<ValuePart<'t>>> {
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::LCurly) => parts.push(ValuePart::Expression(self.expression()?)),
                Some(kind) if kind == string => parts.push(ValuePart::Text(self.expect(kind)?)),
                _ => return Ok(parts),
            }
        }
    }

    /// Attribute text, `{expression}` and `/` not followed by `>`.
    fn unquoted_parts(&mut self) -> PResult<Vec<ValuePart<'t>>> {
        let mut parts = Vec::new();
        loop {
            match (self.peek_kind(), self.peek_nth_kind(1)) {
                (Some(TokenKind::AttrText), _) => {
                    parts.push(ValuePart::Text(self.expect(TokenKind::AttrText)?))
                }
                (Some(TokenKind::Slash), next) if next != Some(TokenKind::RAngle) => {
                    parts.push(ValuePart::Text(self.expect(TokenKind::Slash)?))
                }
                (Some(TokenKind::LCurly), _) => {
                    parts.push(ValuePart::Expression(self.expression()?))
                }
                _ => return Ok(parts),
            }
        }
    }

    // =========================================================================
    // Recovery and errors
    // =========================================================================

    /// Record a failed rule and skip to the next synchronization token.
    fn recover(&mut self, mismatch: Mismatch) {
        self.pos = self.pos.max(mismatch.at);
        let first = mismatch.at;
        self.skip_to_sync();
        trace!(first, skipped = self.pos - first, "resynchronized");
        self.report(mismatch.name, mismatch.message, first, self.pos);
    }

    fn skip_to_sync(&mut self) {
        while let Some(kind) = self.peek_kind() {
            if is_sync(kind) {
                break;
            }
            self.pos += 1;
        }
    }

    fn is_open_ancestor(&self, name: &str) -> bool {
        let ancestors = self.open_elements.len().saturating_sub(1);
        self.open_elements[..ancestors].iter().any(|open| open == name)
    }

    /// Report an element or branch opened past [`MAX_NESTING`].
    fn nesting_too_deep(&mut self, first: &Token, last: &Token) {
        self.errors.push(ParseError::parser(
            "NestingTooDeep",
            format!("nesting deeper than {MAX_NESTING} levels; children parsed as siblings"),
            Position::new(first.start, last.after()),
        ));
    }

    fn missing_close_tag(&mut self, name: &str) {
        let message = format!("expected </{name}> but found {}", self.found());
        self.report_here("MissingCloseTag", message);
    }

    /// Report an error spanning tokens `first..end`, or the token at `first`
    /// alone when nothing was skipped.
    fn report(&mut self, name: &str, message: String, first: usize, end: usize) {
        let position = match self.tokens.get(first) {
            Some(token) => {
                let last = &self.tokens[end.clamp(first + 1, self.tokens.len()) - 1];
                Position::new(token.start, last.after())
            }
            None => Position::empty(self.end_of_input()),
        };
        self.errors.push(ParseError::parser(name, message, position));
    }

    /// Report an error at the current token without skipping anything.
    fn report_here(&mut self, name: &str, message: String) {
        self.report(name, message, self.pos, self.pos);
    }

    fn mismatch(&self, expected: &str) -> Mismatch {
        self.mismatch_with("MismatchedToken", expected)
    }

    fn mismatch_with(&self, name: &'static str, expected: &str) -> Mismatch {
        Mismatch {
            name,
            message: format!("expected {expected} but found {}", self.found()),
            at: self.pos,
        }
    }

    /// Description of the current token for messages.
    fn found(&self) -> String {
        match self.peek() {
            Some(token) => format!("'{}'", token.image),
            None => "end of input".to_string(),
        }
    }

    fn end_of_input(&self) -> Point {
        self.tokens.last().map_or(Point::START, Token::after)
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    /// Consume the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> Option<&'t Token> {
        let token = self.peek().filter(|t| t.kind == kind)?;
        self.pos += 1;
        Some(token)
    }

    /// Consume a token of the given kind or fail without consuming.
    fn expect(&mut self, kind: TokenKind) -> PResult<&'t Token> {
        self.eat(kind)
            .ok_or_else(|| self.mismatch(kind.describe()))
    }
}

/// Tokens that can start content or close an element; recovery stops here.
fn is_sync(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::TextContent
            | TokenKind::CommentTag
            | TokenKind::OpenTag
            | TokenKind::CloseTag
            | TokenKind::OpenScriptTag
            | TokenKind::OpenStyleTag
            | TokenKind::OpenTextAreaTag
            | TokenKind::LCurly
    )
}
