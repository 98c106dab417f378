//! Schema → Markdown conversion.
//!
//! The schema tree is first mapped to mdast (plugin rules first, built-in
//! mapping otherwise) and then printed by [`Renderer::to_markdown`].

use mdforge_core::{Element, ElementKind, Marks, Node, Text};
use serde_json::Value;
use tracing::debug;

use crate::ir::MdNode;
use crate::renderer::Renderer;
use crate::rules::SerializeRuleRef;

#[derive(Clone, Default)]
pub struct MarkdownSerializer {
    rules: Vec<SerializeRuleRef>,
}

/// Marks that become mdast wrapper nodes, outermost first.
#[derive(Clone, Copy)]
enum WrapMark {
    Link,
    Strong,
    Emphasis,
    Delete,
}

const WRAP_ORDER: [WrapMark; 4] = [WrapMark::Link, WrapMark::Strong, WrapMark::Emphasis, WrapMark::Delete];

impl WrapMark {
    fn key(self, marks: &Marks) -> Option<String> {
        match self {
            WrapMark::Link => marks.url.clone(),
            WrapMark::Strong => marks.bold.then(String::new),
            WrapMark::Emphasis => marks.italic.then(String::new),
            WrapMark::Delete => marks.strikethrough.then(String::new),
        }
    }

    fn wrap(self, key: String, children: Vec<MdNode>) -> MdNode {
        match self {
            WrapMark::Link => MdNode::Link { url: key, title: None, children },
            WrapMark::Strong => MdNode::Strong { children },
            WrapMark::Emphasis => MdNode::Emphasis { children },
            WrapMark::Delete => MdNode::Delete { children },
        }
    }
}

impl MarkdownSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<SerializeRuleRef>) -> Self {
        Self { rules }
    }

    /// Serialize a schema tree to Markdown text.
    pub fn serialize(&self, nodes: &[Node]) -> String {
        Renderer::to_markdown(&self.to_mdast(nodes))
    }

    pub fn to_mdast(&self, nodes: &[Node]) -> MdNode {
        MdNode::Root { children: self.blocks(nodes) }
    }

    /// Block siblings; inline strays are grouped into paragraphs.
    pub fn blocks(&self, nodes: &[Node]) -> Vec<MdNode> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut run: Vec<Node> = Vec::new();
        for node in nodes {
            match node {
                Node::Element(el) if !el.kind.is_inline() => {
                    if !run.is_empty() {
                        out.push(MdNode::Paragraph { children: self.inline(&run) });
                        run.clear();
                    }
                    out.extend(self.block(el));
                }
                other => run.push(other.clone()),
            }
        }
        if !run.is_empty() {
            out.push(MdNode::Paragraph { children: self.inline(&run) });
        }
        out
    }

    /// One block element, preceded by its configuration comment if it has one.
    pub fn block(&self, el: &Element) -> Vec<MdNode> {
        let mut out = Vec::new();
        if !el.props.is_empty() {
            let json = Value::Object(el.props.clone());
            out.push(MdNode::html(format!("<!-- {json} -->")));
        }

        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(el)) {
            debug!(rule = rule.name(), "Serialize rule matched");
            out.extend(rule.convert(el, self));
            return out;
        }

        let node = match &el.kind {
            ElementKind::Paragraph => MdNode::Paragraph { children: self.inline(&el.children) },
            ElementKind::Heading { level } => MdNode::Heading {
                depth: (*level).clamp(1, 6),
                children: self.inline(&el.children),
            },
            ElementKind::List { ordered, start, loose } => MdNode::List {
                ordered: *ordered,
                start: if *ordered { Some(start.unwrap_or(1)) } else { None },
                spread: *loose,
                children: self.blocks(&el.children),
            },
            ElementKind::ListItem { checked } => MdNode::ListItem {
                checked: *checked,
                spread: false,
                children: self.blocks(&el.children),
            },
            ElementKind::Blockquote => MdNode::Blockquote { children: self.blocks(&el.children) },
            ElementKind::Code { language, value } => {
                MdNode::Code { lang: language.clone(), value: value.clone() }
            }
            ElementKind::Think { value } => MdNode::html(format!("<think>\n{value}\n</think>")),
            ElementKind::Table { align } => MdNode::Table {
                align: align.clone(),
                children: el
                    .children
                    .iter()
                    .map(|row| MdNode::TableRow {
                        children: row
                            .children()
                            .iter()
                            .map(|cell| MdNode::TableCell { children: self.inline(cell.children()) })
                            .collect(),
                    })
                    .collect(),
            },
            ElementKind::TableRow | ElementKind::TableCell { .. } => {
                MdNode::Paragraph { children: self.inline(&el.children) }
            }
            ElementKind::Hr => MdNode::ThematicBreak,
            ElementKind::Html { value } => MdNode::html(value.clone()),
            ElementKind::Image { url, alt, title } => MdNode::Paragraph {
                children: vec![MdNode::Image { url: url.clone(), title: title.clone(), alt: alt.clone() }],
            },
            ElementKind::FootnoteDefinition { identifier } => MdNode::FootnoteDefinition {
                identifier: identifier.clone(),
                children: self.blocks(&el.children),
            },
            ElementKind::Custom { name, data } => {
                debug!(name = %name, "No serialize rule for custom element; emitting JSON block");
                let value = serde_json::to_string_pretty(data).unwrap_or_default();
                MdNode::Code { lang: Some(name.clone()), value }
            }
        };
        out.push(node);
        out
    }

    /// Inline content: text leaves are grouped so shared marks become one
    /// wrapper node instead of one per leaf.
    pub fn inline(&self, nodes: &[Node]) -> Vec<MdNode> {
        let mut out = Vec::new();
        let mut leaves: Vec<Text> = Vec::new();
        for node in nodes {
            match node {
                Node::Text(t) => leaves.push(t.clone()),
                Node::Element(el) => {
                    if !leaves.is_empty() {
                        out.extend(wrap_leaves(&leaves, 0));
                        leaves.clear();
                    }
                    out.extend(self.inline_element(el));
                }
            }
        }
        if !leaves.is_empty() {
            out.extend(wrap_leaves(&leaves, 0));
        }
        out
    }

    fn inline_element(&self, el: &Element) -> Vec<MdNode> {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(el)) {
            return rule.convert(el, self);
        }
        match &el.kind {
            ElementKind::Image { url, alt, title } => {
                vec![MdNode::Image { url: url.clone(), title: title.clone(), alt: alt.clone() }]
            }
            _ => vec![MdNode::text(Node::Element(el.clone()).plain_text())],
        }
    }
}

/// Serialize `nodes` with the given rule chain.
pub fn to_markdown(nodes: &[Node], rules: &[SerializeRuleRef]) -> String {
    MarkdownSerializer::with_rules(rules.to_vec()).serialize(nodes)
}

fn wrap_leaves(leaves: &[Text], level: usize) -> Vec<MdNode> {
    let Some(mark) = WRAP_ORDER.get(level).copied() else {
        return leaves.iter().flat_map(leaf).collect();
    };

    let mut out = Vec::new();
    let mut start = 0;
    while start < leaves.len() {
        let key = mark.key(&leaves[start].marks);
        let mut end = start + 1;
        while end < leaves.len() && mark.key(&leaves[end].marks) == key {
            end += 1;
        }
        let group = &leaves[start..end];
        match key {
            None => out.extend(wrap_leaves(group, level + 1)),
            Some(key) => {
                let (lead, inner, trail) = split_outer_whitespace(group, matches!(mark, WrapMark::Link));
                if let Some(lead) = lead {
                    out.push(MdNode::text(lead));
                }
                if !inner.is_empty() {
                    out.push(mark.wrap(key, wrap_leaves(&inner, level + 1)));
                }
                if let Some(trail) = trail {
                    out.push(MdNode::text(trail));
                }
            }
        }
        start = end;
    }
    out
}

/// Emphasis delimiters cannot sit next to whitespace, so leading and
/// trailing whitespace moves outside the wrapper. Links keep theirs.
fn split_outer_whitespace(group: &[Text], keep: bool) -> (Option<String>, Vec<Text>, Option<String>) {
    let mut inner = group.to_vec();
    if keep {
        return (None, inner, None);
    }
    let mut lead = None;
    let mut trail = None;
    if let Some(first) = inner.first_mut() {
        let trimmed = first.text.trim_start().to_string();
        if trimmed.len() != first.text.len() {
            lead = Some(first.text[..first.text.len() - trimmed.len()].to_string());
            first.text = trimmed;
        }
    }
    if let Some(last) = inner.last_mut() {
        let trimmed = last.text.trim_end().to_string();
        if trimmed.len() != last.text.len() {
            trail = Some(last.text[trimmed.len()..].to_string());
            last.text = trimmed;
        }
    }
    inner.retain(|t| !t.text.is_empty() || t.marks.footnote.is_some());
    (lead, inner, trail)
}

/// Innermost conversion of one leaf: code, footnote, and HTML-wrapped marks.
fn leaf(text: &Text) -> Vec<MdNode> {
    if let Some(identifier) = &text.marks.footnote {
        return vec![MdNode::FootnoteReference { identifier: identifier.clone() }];
    }
    let core = if text.marks.code {
        MdNode::InlineCode { value: text.text.clone() }
    } else {
        MdNode::text(text.text.clone())
    };

    let mut open = Vec::new();
    let mut close = Vec::new();
    if let Some(color) = &text.marks.color {
        open.push(MdNode::html(format!("<font color=\"{color}\">")));
        close.push(MdNode::html("</font>"));
    }
    if text.marks.sup {
        open.push(MdNode::html("<sup>"));
        close.push(MdNode::html("</sup>"));
    }
    if text.marks.sub {
        open.push(MdNode::html("<sub>"));
        close.push(MdNode::html("</sub>"));
    }
    close.reverse();

    let mut out = open;
    out.push(core);
    out.extend(close);
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parser::MarkdownParser;
    use crate::rules::FnSerializeRule;

    fn round_trip(md: &str) -> String {
        let nodes = MarkdownParser::new().parse(md).nodes;
        MarkdownSerializer::new().serialize(&nodes)
    }

    fn assert_idempotent(md: &str) {
        let parser = MarkdownParser::new();
        let first = parser.parse(md).nodes;
        let again = parser.parse(&MarkdownSerializer::new().serialize(&first)).nodes;
        assert_eq!(first, again, "re-parse differs for {md:?}");
    }

    #[test]
    fn heading_and_list_scenario_round_trips() {
        assert_eq!(round_trip("# Title\n\n- a\n- b"), "# Title\n\n- a\n- b");
    }

    #[test]
    fn standard_constructs_round_trip() {
        let md = "## Section\n\nSome **bold**, *italic*, ~~gone~~ and `code`.\n\n\
                  1. one\n2. two\n\n\
                  > quoted\n\n\
                  [site](https://example.com) ![logo](logo.png)\n\n\
                  ```rust\nfn main() {}\n```\n\n\
                  | a | b |\n| --- | --- |\n| 1 | 2 |";
        assert_eq!(round_trip(md), md);
    }

    #[test]
    fn reparse_is_idempotent() {
        for md in [
            "# Title\n\n- a\n- b",
            "- [x] done\n- [ ] open",
            "1. first\n\n   second paragraph\n2. next",
            "***bold italic*** plain **bold *mixed***",
            "| left | right |\n| :--- | ---: |\n| 1 | 2 |",
            "<font color=\"red\">warm</font> x<sup>2</sup>",
            "Note[^n].\n\n[^n]: The note.",
            "<!-- {\"align\":\"right\"} -->\nRight aligned",
            "<think>\nreasoning\n</think>\n\nanswer",
            "literal \\*stars\\* and \\_under\\_",
            "- outer\n  - inner\n- back",
            "***",
            "```html\n<think>plan</think>\n```",
            "Use the `<think>` tag.",
            "<font color=\"red\">\nwarm\n</font>",
            "<sup>\n2\n</sup>",
            "a\n\n<br>\n\nb",
            "**a[^1]**\n\n[^1]: note",
        ] {
            assert_idempotent(md);
        }
    }

    #[test]
    fn html_like_code_round_trips_verbatim() {
        for md in ["```html\n<think>plan</think>\n```", "Use the `<think>` tag."] {
            assert_eq!(round_trip(md), md);
        }
    }

    #[test]
    fn block_level_inline_tags_serialize_as_inline_html() {
        assert_eq!(round_trip("<font color=\"red\">\nwarm\n</font>"), "<font color=\"red\">warm</font>");
        assert_eq!(round_trip("a\n\n<br>\n\nb"), "a\n\nb");
    }

    #[test]
    fn think_serializes_back_to_tag() {
        assert_eq!(
            round_trip("<think>\nsteps\n</think>\n\ndone"),
            "<think>\nsteps\n</think>\n\ndone"
        );
    }

    #[test]
    fn props_become_config_comment() {
        let out = round_trip("<!-- {\"align\":\"center\"} -->\nMiddle");
        assert_eq!(out, "<!-- {\"align\":\"center\"} -->\n\nMiddle");
    }

    #[test]
    fn whitespace_moves_outside_emphasis() {
        let nodes = vec![Node::Element(Element::paragraph(vec![
            Node::Text(Text::with_marks("loud ", Marks { bold: true, ..Default::default() })),
            Node::text("quiet"),
        ]))];
        assert_eq!(MarkdownSerializer::new().serialize(&nodes), "**loud** quiet");
    }

    #[test]
    fn serialize_rule_overrides_builtin() {
        let rule = FnSerializeRule::new(
            "hr-as-dashes",
            |el: &Element| el.kind == ElementKind::Hr,
            |_: &Element, _: &MarkdownSerializer| vec![MdNode::html("<hr/>")],
        );
        let serializer = MarkdownSerializer::with_rules(vec![Arc::new(rule)]);
        let nodes = vec![Node::Element(Element::void(ElementKind::Hr))];
        assert_eq!(serializer.serialize(&nodes), "<hr/>");
    }
}
