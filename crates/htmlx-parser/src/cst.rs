//! Concrete syntax tree.
//!
//! One product type per grammar rule, holding borrowed tokens from the token
//! stream. Built bottom-up by the parser and consumed once by the transform.

use htmlx_lexer::Token;

type Tok<'t> = &'t Token;

/// `root := tag_content`
#[derive(Debug, Clone)]
pub struct Root<'t> {
    pub content: TagContent<'t>,
}

/// `tag_content := tag_child*`
#[derive(Debug, Clone, Default)]
pub struct TagContent<'t> {
    pub children: Vec<TagChild<'t>>,
}

#[derive(Debug, Clone)]
pub enum TagChild<'t> {
    Tag(Box<Tag<'t>>),
    Script(RawTag<'t>),
    Style(RawTag<'t>),
    TextArea(RawTag<'t>),
    Comment(Tok<'t>),
    VoidBlock(VoidBlock<'t>),
    BranchBlock(Box<BranchBlock<'t>>),
    Expression(Expression<'t>),
    Text(Tok<'t>),
}

/// `<name attributes (/> | > | > content close?)`
#[derive(Debug, Clone)]
pub struct Tag<'t> {
    pub open: Tok<'t>,
    pub attributes: AttributeList<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub body: TagBody<'t>,
}

#[derive(Debug, Clone)]
pub enum TagBody<'t> {
    /// `/>`
    SelfClose { slash: Tok<'t>, r_angle: Tok<'t> },
    /// `>` of a void element.
    Void { r_angle: Tok<'t> },
    /// `>`, children and the close tag, which is absent for an auto-closed
    /// element or after a recovered error.
    Content {
        r_angle: Tok<'t>,
        content: TagContent<'t>,
        close: Option<CloseTag<'t>>,
    },
}

/// `</name >`
#[derive(Debug, Clone)]
pub struct CloseTag<'t> {
    pub open: Tok<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub r_angle: Tok<'t>,
}

/// `<script>`, `<style>` or `<textarea>`.
#[derive(Debug, Clone)]
pub struct RawTag<'t> {
    pub open: Tok<'t>,
    pub attributes: AttributeList<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub body: RawBody<'t>,
}

#[derive(Debug, Clone)]
pub enum RawBody<'t> {
    SelfClose(Tok<'t>),
    /// `>` and the single content-and-end-tag token.
    Content { r_angle: Tok<'t>, content: Tok<'t> },
}

/// `{@name expression?}`
#[derive(Debug, Clone)]
pub struct VoidBlock<'t> {
    pub l_curly: Tok<'t>,
    pub name: Tok<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub expression: Option<Tok<'t>>,
    pub r_curly: Tok<'t>,
}

/// `start_branch branch* block_end`
#[derive(Debug, Clone)]
pub struct BranchBlock<'t> {
    pub start: Branch<'t>,
    pub branches: Vec<Branch<'t>>,
    pub end: Option<BlockEnd<'t>>,
}

/// `{#name expression?} content` or `{:name expression?} content`
#[derive(Debug, Clone)]
pub struct Branch<'t> {
    pub l_curly: Tok<'t>,
    pub sigil: Tok<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub expression: Option<Tok<'t>>,
    pub r_curly: Tok<'t>,
    pub content: TagContent<'t>,
}

/// `{/name}`
#[derive(Debug, Clone)]
pub struct BlockEnd<'t> {
    pub l_curly: Tok<'t>,
    pub sigil: Tok<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub r_curly: Tok<'t>,
}

/// `{ expression }`
#[derive(Debug, Clone)]
pub struct Expression<'t> {
    pub l_curly: Tok<'t>,
    pub whitespace: Option<Tok<'t>>,
    pub content: Tok<'t>,
    pub r_curly: Tok<'t>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeList<'t> {
    pub items: Vec<AttributeItem<'t>>,
}

#[derive(Debug, Clone)]
pub struct AttributeItem<'t> {
    pub whitespace: Option<Tok<'t>>,
    pub attribute: AttributeOrExpression<'t>,
}

#[derive(Debug, Clone)]
pub enum AttributeOrExpression<'t> {
    Attribute(Attribute<'t>),
    Expression(Expression<'t>),
}

/// `name (| modifier)* (= value)?`
#[derive(Debug, Clone)]
pub struct Attribute<'t> {
    pub name: Tok<'t>,
    pub modifiers: Vec<Modifier<'t>>,
    pub value: Option<AttributeValue<'t>>,
}

#[derive(Debug, Clone)]
pub struct Modifier<'t> {
    pub pipe: Tok<'t>,
    pub name: Tok<'t>,
}

#[derive(Debug, Clone)]
pub struct AttributeValue<'t> {
    pub equal: Tok<'t>,
    pub value: QuotedValue<'t>,
}

#[derive(Debug, Clone)]
pub enum QuotedValue<'t> {
    Double {
        open: Tok<'t>,
        parts: Vec<ValuePart<'t>>,
        close: Tok<'t>,
    },
    Single {
        open: Tok<'t>,
        parts: Vec<ValuePart<'t>>,
        close: Tok<'t>,
    },
    Unquoted {
        parts: Vec<ValuePart<'t>>,
    },
}

#[derive(Debug, Clone)]
pub enum ValuePart<'t> {
    /// String content, or attribute text and `/` in an unquoted value.
    Text(Tok<'t>),
    Expression(Expression<'t>),
}
