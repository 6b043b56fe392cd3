//! CST to AST transform.
//!
//! Walks the concrete tree once, classifying tags and attributes by the shape
//! of their names and computing every node position from its first token to
//! its last token or child. Total over every tree the parser builds,
//! including the shapes left behind by error recovery.

use htmlx_lexer::{Point, Position, Token};

use crate::ast::{
    self, Attribute, BranchingBlock, Comment, Directive, Modifier, Node, Property, Shorthand, Tag,
    Text,
};
use crate::cst;

/// Transform a concrete syntax tree into the AST.
pub fn transform(root: cst::Root<'_>) -> ast::Root {
    let children = content(root.content);
    let position = match (children.first(), children.last()) {
        (Some(first), Some(last)) => Position::new(first.position().start, last.position().end),
        _ => Position::empty(Point::START),
    };
    ast::Root { children, position }
}

fn content(content: cst::TagContent<'_>) -> Vec<Node> {
    content.children.into_iter().map(child).collect()
}

fn child(child: cst::TagChild<'_>) -> Node {
    match child {
        cst::TagChild::Tag(tag) => element(*tag),
        cst::TagChild::Script(raw) => Node::Script(raw_tag(raw, "</script>")),
        cst::TagChild::Style(raw) => Node::Style(raw_tag(raw, "</style>")),
        cst::TagChild::TextArea(raw) => Node::Element(raw_tag(raw, "</textarea>")),
        cst::TagChild::Comment(token) => Node::Comment(comment(token)),
        cst::TagChild::VoidBlock(block) => Node::VoidBlock(void_block(block)),
        cst::TagChild::BranchBlock(block) => Node::BranchingBlock(branch_block(*block)),
        cst::TagChild::Expression(expr) => Node::Expression(expression(&expr)),
        cst::TagChild::Text(token) => Node::Text(text(token)),
    }
}

// =============================================================================
// Tags
// =============================================================================

/// `ns:name` is a meta tag, otherwise the case of the first character picks
/// element or component.
fn element(tag: cst::Tag<'_>) -> Node {
    let start = tag.open.start;
    let (self_closing, children, end) = match tag.body {
        cst::TagBody::SelfClose { r_angle, .. } => (true, Vec::new(), r_angle.after()),
        cst::TagBody::Void { r_angle } => (false, Vec::new(), r_angle.after()),
        cst::TagBody::Content {
            r_angle,
            content: body,
            close,
        } => {
            let children = content(body);
            let end = match close {
                Some(close) => close.r_angle.after(),
                None => children
                    .last()
                    .map_or_else(|| r_angle.after(), |n| n.position().end),
            };
            (false, children, end)
        }
    };

    let name = tag.open.tag_name();
    let tag_name = match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    };
    let payload = Tag {
        tag_name: tag_name.to_string(),
        self_closing,
        properties: attributes(tag.attributes),
        children,
        position: Position::new(start, end),
    };

    if name.contains(':') {
        Node::Meta(payload)
    } else if name.starts_with(|c: char| c.is_uppercase()) {
        Node::Component(payload)
    } else {
        Node::Element(payload)
    }
}

/// `<script>`, `<style>` and `<textarea>`, whose content is one raw text
/// child without the end tag.
fn raw_tag(raw: cst::RawTag<'_>, end_tag: &str) -> Tag {
    let start = raw.open.start;
    let (self_closing, children, end) = match raw.body {
        cst::RawBody::SelfClose(close) => (true, Vec::new(), close.after()),
        cst::RawBody::Content { content, .. } => {
            let split = content.image.len().saturating_sub(end_tag.len());
            let value = content.image.get(..split).unwrap_or_default();
            let text = Text {
                value: value.to_string(),
                position: Position::new(content.start, content.after().back(end_tag.len())),
            };
            (false, vec![Node::Text(text)], content.after())
        }
    };

    Tag {
        tag_name: raw.open.tag_name().to_string(),
        self_closing,
        properties: attributes(raw.attributes),
        children,
        position: Position::new(start, end),
    }
}

// =============================================================================
// Attributes
// =============================================================================

fn attributes(list: cst::AttributeList<'_>) -> Vec<Attribute> {
    list.items
        .into_iter()
        .map(|item| match item.attribute {
            cst::AttributeOrExpression::Attribute(attr) => attribute(attr),
            cst::AttributeOrExpression::Expression(expr) => {
                let expr = expression(&expr);
                Attribute::Property(Property {
                    name: expr.value.trim().to_string(),
                    shorthand: Shorthand::Expression,
                    modifiers: Vec::new(),
                    position: expr.position,
                    value: vec![ast::ValuePart::Expression(expr)],
                })
            }
        })
        .collect()
}

/// `name:specifier` is a directive, anything else a property.
fn attribute(attr: cst::Attribute<'_>) -> Attribute {
    let start = attr.name.start;
    let name_end = attr
        .modifiers
        .last()
        .map_or_else(|| attr.name.after(), |m| m.name.after());
    let modifiers = attr
        .modifiers
        .iter()
        .map(|m| Modifier {
            value: m.name.image.clone(),
            position: m.name.position(),
        })
        .collect();

    let shorthand = match attr.value {
        Some(_) => Shorthand::None,
        None => Shorthand::Boolean,
    };
    let (value, end) = match attr.value {
        None => (Vec::new(), name_end),
        Some(cst::AttributeValue { equal, value }) => match value {
            cst::QuotedValue::Double { parts, close, .. }
            | cst::QuotedValue::Single { parts, close, .. } => (value_parts(parts), close.after()),
            cst::QuotedValue::Unquoted { parts } => {
                let parts = value_parts(parts);
                let end = parts
                    .last()
                    .map_or_else(|| equal.after(), |p| p.position().end);
                (parts, end)
            }
        },
    };
    let position = Position::new(start, end);

    match attr.name.image.split_once(':') {
        Some((name, specifier)) => Attribute::Directive(Directive {
            name: name.to_string(),
            specifier: specifier.to_string(),
            shorthand: Shorthand::None,
            modifiers,
            value,
            position,
        }),
        None => Attribute::Property(Property {
            name: attr.name.image.clone(),
            shorthand,
            modifiers,
            value,
            position,
        }),
    }
}

/// Expressions stay separate; adjacent literal pieces merge into one text.
fn value_parts(parts: Vec<cst::ValuePart<'_>>) -> Vec<ast::ValuePart> {
    let mut merged: Vec<ast::ValuePart> = Vec::with_capacity(parts.len());
    for part in parts {
        let token = match part {
            cst::ValuePart::Expression(expr) => {
                merged.push(ast::ValuePart::Expression(expression(&expr)));
                continue;
            }
            cst::ValuePart::Text(token) => token,
        };
        if let Some(ast::ValuePart::Text(prev)) = merged.last_mut() {
            prev.value.push_str(&token.image);
            prev.position.end = token.after();
            continue;
        }
        merged.push(ast::ValuePart::Text(text(token)));
    }
    merged
}

// =============================================================================
// Blocks
// =============================================================================

fn void_block(block: cst::VoidBlock<'_>) -> ast::VoidBlock {
    ast::VoidBlock {
        name: block.name.block_name().to_string(),
        expression: block.expression.map(token_expression),
        position: Position::new(block.l_curly.start, block.r_curly.after()),
    }
}

fn branch_block(block: cst::BranchBlock<'_>) -> BranchingBlock {
    let start = block.start.l_curly.start;
    let name = block.start.sigil.block_name().to_string();
    let end_marker = block.end.map(|end| end.r_curly.after());

    let branches: Vec<ast::Branch> = std::iter::once(block.start)
        .chain(block.branches)
        .map(branch)
        .collect();
    let end = end_marker
        .or_else(|| branches.last().map(|b| b.position.end))
        .unwrap_or(start);

    BranchingBlock {
        name,
        branches,
        position: Position::new(start, end),
    }
}

fn branch(branch: cst::Branch<'_>) -> ast::Branch {
    let children = content(branch.content);
    let end = children
        .last()
        .map_or_else(|| branch.r_curly.after(), |n| n.position().end);
    ast::Branch {
        name: branch.sigil.block_name().to_string(),
        expression: branch.expression.map(token_expression),
        children,
        position: Position::new(branch.l_curly.start, end),
    }
}

// =============================================================================
// Leaves
// =============================================================================

/// `{ content }`, spanning both braces.
fn expression(expr: &cst::Expression<'_>) -> ast::Expression {
    ast::Expression {
        value: expr.content.image.clone(),
        position: Position::new(expr.l_curly.start, expr.r_curly.after()),
    }
}

/// The bare expression of a block or branch header.
fn token_expression(token: &Token) -> ast::Expression {
    ast::Expression {
        value: token.image.clone(),
        position: token.position(),
    }
}

fn text(token: &Token) -> Text {
    Text {
        value: token.image.clone(),
        position: token.position(),
    }
}

fn comment(token: &Token) -> Comment {
    let body = token.image.strip_prefix("<!--").unwrap_or(&token.image);
    let body = body.strip_suffix("-->").unwrap_or(body);
    Comment {
        value: body.to_string(),
        position: token.position(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, ParseResult};
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> ast::Root {
        let ParseResult { ast, errors } = parse(source);
        assert_eq!(errors, vec![], "errors for {source:?}");
        ast
    }

    fn tag(node: &Node) -> &Tag {
        node.as_tag().expect("tag node")
    }

    fn slice<'s>(source: &'s str, position: Position) -> &'s str {
        position.slice(source)
    }

    /// Every node must start no earlier than the previous sibling ended, and
    /// text and expression nodes must slice back to their own source.
    fn check_positions(source: &str, nodes: &[Node]) {
        let mut previous_end = 0;
        for node in nodes {
            let position = node.position();
            assert!(position.start.offset >= previous_end, "{node:?}");
            assert!(position.start.offset <= position.end.offset, "{node:?}");
            previous_end = position.end.offset;

            match node {
                Node::Text(text) => assert_eq!(slice(source, text.position), text.value),
                Node::Expression(expr) => {
                    let slice = slice(source, expr.position);
                    let inner = slice.trim_start_matches('{').trim_end_matches('}');
                    assert_eq!(inner.trim(), expr.value.trim());
                }
                Node::BranchingBlock(block) => {
                    for branch in &block.branches {
                        check_positions(source, &branch.children);
                    }
                }
                _ => {
                    if let Some(tag) = node.as_tag() {
                        assert!(slice(source, tag.position).starts_with('<'));
                        check_positions(source, &tag.children);
                    }
                }
            }
        }
    }

    #[test]
    fn test_classification() {
        let ast = parse_ok("<div></div><Nested/><svelte:head></svelte:head>");
        assert!(matches!(&ast.children[0], Node::Element(t) if t.tag_name == "div"));
        assert!(matches!(&ast.children[1], Node::Component(t) if t.tag_name == "Nested"));
        assert!(matches!(&ast.children[2], Node::Meta(t) if t.tag_name == "head"));
    }

    #[test]
    fn test_self_closing_position() {
        let ast = parse_ok("<input/>");
        let input = tag(&ast.children[0]);
        assert!(input.self_closing);
        assert_eq!(input.position, Position::new(Point::START, Point::new(1, 9, 8)));
    }

    #[test]
    fn test_void_element_position() {
        let source = "<hr><img src=a.png>";
        let ast = parse_ok(source);
        assert_eq!(ast.children.len(), 2);
        assert!(!tag(&ast.children[0]).self_closing);
        assert_eq!(slice(source, ast.children[1].position()), "<img src=a.png>");
    }

    #[test]
    fn test_element_with_children() {
        let source = "<p>Hello <b>{name}</b>!</p>";
        let ast = parse_ok(source);
        let p = tag(&ast.children[0]);
        assert_eq!(p.position, Position::new(Point::START, Point::new(1, 28, 27)));
        assert_eq!(p.children.len(), 3);
        let b = tag(&p.children[1]);
        assert_eq!(slice(source, b.position), "<b>{name}</b>");
        assert!(matches!(&b.children[0], Node::Expression(e) if e.value == "name"));
        check_positions(source, &ast.children);
    }

    #[test]
    fn test_branching_block() {
        let source = "{#if x}A{:else}B{/if}";
        let ast = parse_ok(source);
        let [Node::BranchingBlock(block)] = ast.children.as_slice() else {
            panic!("expected one block, got {:?}", ast.children);
        };
        assert_eq!(block.name, "if");
        assert_eq!(block.position, Position::new(Point::START, Point::new(1, 22, 21)));
        assert_eq!(block.branches.len(), 2);

        let first = &block.branches[0];
        assert_eq!(first.name, "if");
        assert_eq!(first.expression.as_ref().map(|e| e.value.as_str()), Some("x"));
        assert!(matches!(&first.children[..], [Node::Text(t)] if t.value == "A"));
        assert_eq!(slice(source, first.position), "{#if x}A");

        let second = &block.branches[1];
        assert_eq!(second.name, "else");
        assert_eq!(second.expression, None);
        assert!(matches!(&second.children[..], [Node::Text(t)] if t.value == "B"));
        assert_eq!(slice(source, second.position), "{:else}B");
    }

    #[test]
    fn test_branch_expression_spans_content_token() {
        let source = "{#each items as item}{item}{/each}";
        let ast = parse_ok(source);
        let Node::BranchingBlock(block) = &ast.children[0] else {
            panic!("expected block");
        };
        let expr = block.branches[0].expression.as_ref().expect("expression");
        assert_eq!(expr.value, "items as item");
        assert_eq!(slice(source, expr.position), "items as item");
    }

    #[test]
    fn test_void_block() {
        let source = "{@html '<b>x</b>'}";
        let ast = parse_ok(source);
        let Node::VoidBlock(block) = &ast.children[0] else {
            panic!("expected void block");
        };
        assert_eq!(block.name, "html");
        assert_eq!(
            block.expression.as_ref().map(|e| e.value.as_str()),
            Some("'<b>x</b>'")
        );
        assert_eq!(slice(source, block.position), source);
    }

    #[test]
    fn test_balanced_expressions() {
        for source in ["{ {a:1} }", r#"{ "}" }"#, "{ `${x}` }"] {
            let ast = parse_ok(source);
            let [Node::Expression(expr)] = ast.children.as_slice() else {
                panic!("expected one expression for {source:?}, got {:?}", ast.children);
            };
            assert_eq!(slice(source, expr.position), source);
        }
    }

    #[test]
    fn test_script_and_style_content() {
        let source = "<script context=\"module\">let a = 1;</script>\n<style>p { color: red; }</style>";
        let ast = parse_ok(source);

        let Node::Script(script) = &ast.children[0] else {
            panic!("expected script");
        };
        assert_eq!(script.tag_name, "script");
        assert_eq!(script.properties.len(), 1);
        let [Node::Text(content)] = &script.children[..] else {
            panic!("expected raw text");
        };
        assert_eq!(content.value, "let a = 1;");
        assert_eq!(slice(source, content.position), "let a = 1;");
        assert_eq!(
            slice(source, script.position),
            "<script context=\"module\">let a = 1;</script>"
        );

        let Node::Style(style) = &ast.children[2] else {
            panic!("expected style");
        };
        assert!(matches!(&style.children[..], [Node::Text(t)] if t.value == "p { color: red; }"));
    }

    #[test]
    fn test_self_closing_script_has_no_children() {
        let ast = parse_ok("<script src=\"a.js\"/>");
        let Node::Script(script) = &ast.children[0] else {
            panic!("expected script");
        };
        assert!(script.self_closing);
        assert!(script.children.is_empty());
    }

    #[test]
    fn test_textarea_is_element_with_raw_text() {
        let ast = parse_ok("<textarea>a <b> {c}</textarea>");
        let Node::Element(area) = &ast.children[0] else {
            panic!("expected element");
        };
        assert_eq!(area.tag_name, "textarea");
        assert!(matches!(&area.children[..], [Node::Text(t)] if t.value == "a <b> {c}"));
    }

    #[test]
    fn test_comment_markers_stripped() {
        let source = "<!-- note -->";
        let ast = parse_ok(source);
        let Node::Comment(comment) = &ast.children[0] else {
            panic!("expected comment");
        };
        assert_eq!(comment.value, " note ");
        assert_eq!(slice(source, comment.position), source);
    }

    #[test]
    fn test_property_shorthands() {
        let source = "<input disabled value=\"a{b}c\" {checked} size=10>";
        let ast = parse_ok(source);
        let input = tag(&ast.children[0]);
        let props: Vec<&Property> = input
            .properties
            .iter()
            .map(|a| match a {
                Attribute::Property(p) => p,
                other => panic!("expected property, got {other:?}"),
            })
            .collect();

        assert_eq!(props[0].name, "disabled");
        assert_eq!(props[0].shorthand, Shorthand::Boolean);
        assert_eq!(slice(source, props[0].position), "disabled");

        assert_eq!(props[1].shorthand, Shorthand::None);
        assert_eq!(props[1].value.len(), 3);
        assert_eq!(slice(source, props[1].position), "value=\"a{b}c\"");
        assert_eq!(slice(source, props[1].value[1].position()), "{b}");

        assert_eq!(props[2].name, "checked");
        assert_eq!(props[2].shorthand, Shorthand::Expression);
        assert_eq!(slice(source, props[2].position), "{checked}");

        assert_eq!(slice(source, props[3].position), "size=10");
    }

    #[test]
    fn test_directive_with_modifiers() {
        let source = "<button on:click|once|preventDefault={handle}>go</button>";
        let ast = parse_ok(source);
        let [Attribute::Directive(directive)] = &tag(&ast.children[0]).properties[..] else {
            panic!("expected one directive");
        };
        assert_eq!(directive.name, "on");
        assert_eq!(directive.specifier, "click");
        assert_eq!(directive.shorthand, Shorthand::None);
        let modifiers: Vec<&str> = directive.modifiers.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(modifiers, vec!["once", "preventDefault"]);
        assert_eq!(slice(source, directive.modifiers[1].position), "preventDefault");
        assert_eq!(
            slice(source, directive.position),
            "on:click|once|preventDefault={handle}"
        );
    }

    #[test]
    fn test_unquoted_value_with_slashes_merges() {
        let source = "<a href=/docs/intro>x</a>";
        let ast = parse_ok(source);
        let [Attribute::Property(href)] = &tag(&ast.children[0]).properties[..] else {
            panic!("expected one property");
        };
        let [ast::ValuePart::Text(value)] = &href.value[..] else {
            panic!("expected one text part, got {:?}", href.value);
        };
        assert_eq!(value.value, "/docs/intro");
        assert_eq!(slice(source, value.position), "/docs/intro");
    }

    #[test]
    fn test_top_level_slices_reproduce_input() {
        let source = "<!-- head -->\n<script>let n = 0;</script>\n\n<h1 class=\"t\">Count: {n}</h1>\n{#if n > 1}\n  <p>many\n{:else}\n  <Empty/>\n{/if}\n<ul><li>a<li>b</ul>";
        let ast = parse_ok(source);
        let joined: String = ast
            .children
            .iter()
            .map(|node| slice(source, node.position()))
            .collect();
        assert_eq!(joined, source);
        assert_eq!(slice(source, ast.position), source);
        check_positions(source, &ast.children);
    }

    #[test]
    fn test_multiline_positions() {
        let source = "<div>\n  <span>é</span>\n</div>";
        let ast = parse_ok(source);
        let div = tag(&ast.children[0]);
        assert_eq!(div.position.end, Point::new(3, 7, 30));
        let span = tag(&div.children[1]);
        assert_eq!(span.position.start, Point::new(2, 3, 8));
        assert_eq!(span.position.end, Point::new(2, 17, 23));
    }

    #[test]
    fn test_missing_close_tag_ends_at_last_child() {
        let source = "<div><b>x</b>";
        let result = parse(source);
        assert_eq!(result.errors.len(), 1);
        let div = tag(&result.ast.children[0]);
        assert_eq!(slice(source, div.position), source);

        let result = parse("<div>");
        let div = tag(&result.ast.children[0]);
        assert_eq!(div.position.end, Point::new(1, 6, 5));
    }

    #[test]
    fn test_root_starts_at_first_child() {
        let source = "</p>\n<b>x</b>";
        let result = parse(source);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.ast.position.start, Point::new(1, 5, 4));
        assert_eq!(slice(source, result.ast.position), "\n<b>x</b>");
    }

    #[test]
    fn test_unclosed_block_ends_at_last_branch() {
        let source = "{#if a}x{:else}y";
        let result = parse(source);
        assert_eq!(result.errors.len(), 1);
        let Node::BranchingBlock(block) = &result.ast.children[0] else {
            panic!("expected block");
        };
        assert_eq!(slice(source, block.position), source);
    }
}
