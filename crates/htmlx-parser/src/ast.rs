//! Abstract Syntax Tree for HTMLX templates.
//!
//! Every node carries the [`Position`] of the source text it was built from,
//! delimiters included. Embedded script is kept as opaque text.

use htmlx_lexer::Position;
use serde::Serialize;

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Root {
    pub children: Vec<Node>,
    pub position: Position,
}

/// A child of the root, an element or a branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// A lowercase tag: `<div>`.
    Element(Tag),

    /// A capitalized tag: `<Nested>`.
    Component(Tag),

    /// A namespaced tag: `<svelte:head>`, named after the colon.
    Meta(Tag),

    /// `<script>`; its only child is the raw content as [`Text`].
    Script(Tag),

    /// `<style>`; its only child is the raw content as [`Text`].
    Style(Tag),

    /// A single-clause block: `{@html content}`.
    VoidBlock(VoidBlock),

    /// A multi-clause block: `{#if a}...{:else}...{/if}`.
    BranchingBlock(BranchingBlock),

    /// `{expression}`
    Expression(Expression),

    Text(Text),

    Comment(Comment),
}

impl Node {
    pub fn position(&self) -> Position {
        match self {
            Node::Element(tag)
            | Node::Component(tag)
            | Node::Meta(tag)
            | Node::Script(tag)
            | Node::Style(tag) => tag.position,
            Node::VoidBlock(block) => block.position,
            Node::BranchingBlock(block) => block.position,
            Node::Expression(expr) => expr.position,
            Node::Text(text) => text.position,
            Node::Comment(comment) => comment.position,
        }
    }

    /// The tag payload of element-like nodes.
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Element(tag)
            | Node::Component(tag)
            | Node::Meta(tag)
            | Node::Script(tag)
            | Node::Style(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Shared shape of every tag node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_name: String,
    pub self_closing: bool,
    pub properties: Vec<Attribute>,
    pub children: Vec<Node>,
    pub position: Position,
}

/// An attribute on a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attribute {
    /// `name`, `name="value"`, `{name}`
    Property(Property),
    /// `name:specifier|modifier={value}`
    Directive(Directive),
}

impl Attribute {
    pub fn position(&self) -> Position {
        match self {
            Attribute::Property(prop) => prop.position,
            Attribute::Directive(dir) => dir.position,
        }
    }
}

/// How an attribute was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shorthand {
    /// No value: `disabled`.
    Boolean,
    /// An explicit value follows `=`.
    None,
    /// A bare `{name}` attribute.
    Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub shorthand: Shorthand,
    pub modifiers: Vec<Modifier>,
    pub value: Vec<ValuePart>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    pub name: String,
    pub specifier: String,
    pub shorthand: Shorthand,
    pub modifiers: Vec<Modifier>,
    pub value: Vec<ValuePart>,
    pub position: Position,
}

/// A `|modifier` after an attribute name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modifier {
    pub value: String,
    pub position: Position,
}

/// A piece of an attribute value; quoted values interleave text and
/// `{expression}` parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValuePart {
    Text(Text),
    Expression(Expression),
}

impl ValuePart {
    pub fn position(&self) -> Position {
        match self {
            ValuePart::Text(text) => text.position,
            ValuePart::Expression(expr) => expr.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoidBlock {
    pub name: String,
    pub expression: Option<Expression>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchingBlock {
    pub name: String,
    pub branches: Vec<Branch>,
    pub position: Position,
}

/// One clause of a branching block: `{#if x}...`, `{:else}...`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub name: String,
    pub expression: Option<Expression>,
    pub children: Vec<Node>,
    pub position: Position,
}

/// Embedded script, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub value: String,
    pub position: Position,
}

/// Comment body without `<!--` and `-->`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub value: String,
    pub position: Position,
}
