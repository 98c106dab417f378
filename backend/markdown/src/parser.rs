//! Markdown → schema conversion.
//!
//! Walks the mdast depth-first. At every node the plugin rules are asked in
//! registration order and the first match converts the node; otherwise the
//! built-in conversion applies. Parsing never fails: malformed input falls
//! back to the permissive reading of the underlying parser.

use std::borrow::Cow;
use std::collections::HashMap;

use pulldown_cmark::Options;
use mdforge_core::{normalize, Document, Element, ElementKind, Marks, Node, Text};
use serde_json::{Map, Value};
use tracing::debug;

use crate::code_block::THINK_LANGUAGE;
use crate::html::{self, HtmlBlock, InlineTag};
use crate::ir::{IrParser, MdNode};
use crate::rules::ParseRuleRef;

/// Result of a parse: the schema tree plus the footnote definitions found in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub nodes: Vec<Node>,
    /// Footnote identifier → plain text of its definition.
    pub footnotes: HashMap<String, String>,
}

impl ParseOutput {
    pub fn into_document(self) -> Document {
        Document::new(self.nodes)
    }
}

/// Syntax extensions honoured by the parser. Everything is on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// GFM tables, strikethrough and task lists.
    pub gfm: bool,
    pub footnotes: bool,
    /// Rewrite `<think>` regions before parsing.
    pub think_tags: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { gfm: true, footnotes: true, think_tags: true }
    }
}

impl ParseOptions {
    fn extensions(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options |= Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        }
        if self.footnotes {
            options |= Options::ENABLE_FOOTNOTES;
        }
        options
    }
}

#[derive(Clone, Default)]
pub struct MarkdownParser {
    rules: Vec<ParseRuleRef>,
    options: ParseOptions,
}

/// An open allow-listed inline tag and the mark it contributes.
struct InlineFrame {
    name: String,
    color: Option<String>,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<ParseRuleRef>) -> Self {
        Self { rules, options: ParseOptions::default() }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn rules(&self) -> &[ParseRuleRef] {
        &self.rules
    }

    pub fn parse(&self, markdown: &str) -> ParseOutput {
        let source = if self.options.think_tags {
            html::preprocess_think(markdown, self.options.extensions())
        } else {
            Cow::Borrowed(markdown)
        };
        let root = IrParser::parse_with(&source, self.options.extensions());

        let mut doc = Document::new(self.convert_blocks(root.children()));
        normalize(&mut doc);

        let mut footnotes = HashMap::new();
        collect_footnotes(&doc.children, &mut footnotes);
        debug!(blocks = doc.children.len(), footnotes = footnotes.len(), "Parsed markdown");

        ParseOutput { nodes: doc.children, footnotes }
    }

    fn find_rule(&self, node: &MdNode) -> Option<&ParseRuleRef> {
        let rule = self.rules.iter().find(|rule| rule.matches(node))?;
        debug!(rule = rule.name(), "Parse rule matched");
        Some(rule)
    }

    /// Convert block siblings, attaching `<!-- {json} -->` configuration to
    /// the block that follows it.
    pub fn convert_blocks(&self, nodes: &[MdNode]) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut pending: Option<Map<String, Value>> = None;

        for node in nodes {
            let mut converted = match node {
                MdNode::Html { value } if self.find_rule(node).is_none() => {
                    let (config, rest) = html::split_config_comments(value);
                    if let Some(config) = config {
                        pending.get_or_insert_with(Map::new).extend(config);
                    }
                    self.html_block(rest)
                }
                _ => self.convert_node(node),
            };
            if converted.is_empty() {
                continue;
            }
            if let Some(props) = pending.take() {
                if let Some(Node::Element(first)) = converted.first_mut() {
                    first.props.extend(props);
                }
            }
            out.append(&mut converted);
        }
        out
    }

    /// Convert one node through the rule chain, then the built-in mapping.
    pub fn convert_node(&self, node: &MdNode) -> Vec<Node> {
        if let Some(rule) = self.find_rule(node) {
            return rule.convert(node, self);
        }

        let element = match node {
            MdNode::Root { children } => return self.convert_blocks(children),
            MdNode::Paragraph { children } => {
                Element::paragraph(self.convert_inline(children, &Marks::default()))
            }
            MdNode::Heading { depth, children } => Element::new(
                ElementKind::Heading { level: (*depth).clamp(1, 6) },
                self.convert_inline(children, &Marks::default()),
            ),
            MdNode::ThematicBreak => Element::void(ElementKind::Hr),
            MdNode::Blockquote { children } => {
                Element::new(ElementKind::Blockquote, self.convert_blocks(children))
            }
            MdNode::List { ordered, start, spread, children } => Element::new(
                ElementKind::List {
                    ordered: *ordered,
                    start: if *ordered { *start } else { None },
                    loose: *spread,
                },
                self.convert_blocks(children),
            ),
            MdNode::ListItem { checked, children, .. } => Element::new(
                ElementKind::ListItem { checked: *checked },
                self.convert_blocks(children),
            ),
            MdNode::Code { lang, value } => {
                if lang.as_deref() == Some(THINK_LANGUAGE) {
                    Element::void(ElementKind::Think { value: value.clone() })
                } else {
                    Element::void(ElementKind::Code { language: lang.clone(), value: value.clone() })
                }
            }
            MdNode::Html { value } => return self.html_block(value),
            MdNode::Table { align, children } => {
                let rows = children
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.convert_row(row, i == 0))
                    .collect();
                Element::new(ElementKind::Table { align: align.clone() }, rows)
            }
            MdNode::TableRow { .. } => return vec![self.convert_row(node, false)],
            MdNode::TableCell { children } => Element::new(
                ElementKind::table_cell(false),
                self.convert_inline(children, &Marks::default()),
            ),
            MdNode::FootnoteDefinition { identifier, children } => Element::new(
                ElementKind::FootnoteDefinition { identifier: identifier.clone() },
                self.convert_blocks(children),
            ),
            inline => Element::paragraph(
                self.convert_inline(std::slice::from_ref(inline), &Marks::default()),
            ),
        };
        vec![element.into()]
    }

    fn convert_row(&self, row: &MdNode, header: bool) -> Node {
        let cells = row
            .children()
            .iter()
            .map(|cell| {
                Element::new(
                    ElementKind::table_cell(header),
                    self.convert_inline(cell.children(), &Marks::default()),
                )
                .into()
            })
            .collect();
        Node::element(ElementKind::TableRow, cells)
    }

    /// Convert phrasing content under the marks inherited from its ancestors.
    pub fn convert_inline(&self, nodes: &[MdNode], marks: &Marks) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut frames: Vec<InlineFrame> = Vec::new();

        for node in nodes {
            let current = apply_frames(marks, &frames);

            if !matches!(node, MdNode::Html { .. }) {
                if let Some(rule) = self.find_rule(node) {
                    out.extend(rule.convert(node, self));
                    continue;
                }
            }

            match node {
                MdNode::Text { value } => out.push(Text::with_marks(value.clone(), current).into()),
                MdNode::Emphasis { children } => {
                    out.extend(self.convert_inline(children, &Marks { italic: true, ..current }))
                }
                MdNode::Strong { children } => {
                    out.extend(self.convert_inline(children, &Marks { bold: true, ..current }))
                }
                MdNode::Delete { children } => out.extend(
                    self.convert_inline(children, &Marks { strikethrough: true, ..current }),
                ),
                MdNode::InlineCode { value } => {
                    out.push(Text::with_marks(value.clone(), Marks { code: true, ..current }).into())
                }
                MdNode::Break => out.push(Text::with_marks("\n", current).into()),
                MdNode::Link { url, children, .. } => out.extend(
                    self.convert_inline(children, &Marks { url: Some(url.clone()), ..current }),
                ),
                MdNode::Image { url, title, alt } => out.push(
                    Element::void(ElementKind::Image {
                        url: url.clone(),
                        alt: alt.clone(),
                        title: title.clone(),
                    })
                    .into(),
                ),
                MdNode::FootnoteReference { identifier } => out.push(
                    Text::with_marks(
                        identifier.clone(),
                        Marks { footnote: Some(identifier.clone()), ..current },
                    )
                    .into(),
                ),
                MdNode::Html { value } => {
                    for tag in html::inline_tags(value) {
                        match tag {
                            InlineTag::LineBreak => {
                                out.push(Text::with_marks("\n", apply_frames(marks, &frames)).into())
                            }
                            InlineTag::Open { name, color } => {
                                if html::is_allowed_tag(&name) {
                                    frames.push(InlineFrame { name, color });
                                }
                            }
                            InlineTag::Close { name } => {
                                if let Some(pos) = frames.iter().rposition(|f| f.name == name) {
                                    frames.remove(pos);
                                }
                            }
                        }
                    }
                }
                block => out.push(Text::with_marks(plain_text(block), current).into()),
            }
        }
        out
    }

    /// An HTML block outside a table lands as a paragraph whose allow-listed
    /// inline tags become marks. A block left with only whitespace is dropped.
    fn html_block(&self, value: &str) -> Vec<Node> {
        match html::classify_block(value) {
            HtmlBlock::Native(raw) => vec![Element::void(ElementKind::Html { value: raw }).into()],
            HtmlBlock::Inline(cleaned) => {
                let children = self.convert_inline(&html::inline_segments(&cleaned), &Marks::default());
                if children.iter().all(|node| node.plain_text().trim().is_empty()) {
                    debug!("Dropping whitespace-only HTML block");
                    return Vec::new();
                }
                vec![Element::paragraph(children).into()]
            }
            HtmlBlock::Empty => Vec::new(),
        }
    }
}

/// Parse `markdown` with the given rule chain.
pub fn parse_markdown(markdown: &str, rules: &[ParseRuleRef]) -> ParseOutput {
    MarkdownParser::with_rules(rules.to_vec()).parse(markdown)
}

fn apply_frames(marks: &Marks, frames: &[InlineFrame]) -> Marks {
    let mut out = marks.clone();
    for frame in frames {
        match frame.name.as_str() {
            "font" => {
                if let Some(color) = &frame.color {
                    out.color = Some(color.clone());
                }
            }
            "sup" => out.sup = true,
            "sub" => out.sub = true,
            _ => {}
        }
    }
    out
}

fn plain_text(node: &MdNode) -> String {
    match node {
        MdNode::Text { value } | MdNode::InlineCode { value } | MdNode::Code { value, .. } => {
            value.clone()
        }
        MdNode::Image { alt, .. } => alt.clone(),
        MdNode::Html { value } => html::strip_unknown_tags(value),
        other => other.children().iter().map(plain_text).collect(),
    }
}

/// Footnote identifier → plain text of its definition, for every definition in `nodes`.
pub fn footnote_map(nodes: &[Node]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    collect_footnotes(nodes, &mut out);
    out
}

fn collect_footnotes(nodes: &[Node], out: &mut HashMap<String, String>) {
    for node in nodes {
        if let Some(ElementKind::FootnoteDefinition { identifier }) = node.kind() {
            out.insert(identifier.clone(), node.plain_text().trim().to_string());
        }
        collect_footnotes(node.children(), out);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rules::FnParseRule;

    fn parse(md: &str) -> Vec<Node> {
        MarkdownParser::new().parse(md).nodes
    }

    #[test]
    fn heading_and_list_scenario() {
        let nodes = parse("# Title\n\n- a\n- b");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind(), Some(&ElementKind::Heading { level: 1 }));
        assert_eq!(nodes[0].plain_text(), "Title");

        let items = nodes[1].children();
        assert_eq!(items.len(), 2);
        for (item, text) in items.iter().zip(["a", "b"]) {
            assert_eq!(item.kind(), Some(&ElementKind::ListItem { checked: None }));
            assert_eq!(item.children()[0].kind(), Some(&ElementKind::Paragraph));
            assert_eq!(item.plain_text(), text);
        }
    }

    #[test]
    fn unknown_inline_tag_is_transparent() {
        let nodes = parse("<foo>X</foo>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].plain_text(), "X");
        let json = serde_json::to_string(&nodes).unwrap();
        assert!(!json.contains("<foo>"));
        assert!(!json.contains("</foo>"));
    }

    #[test]
    fn unknown_block_tag_is_transparent() {
        let nodes = parse("<div>\nhidden wrapper\n</div>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].plain_text(), "hidden wrapper");
    }

    #[test]
    fn think_tag_becomes_think_node() {
        let nodes = parse("<think>\nweighing options\n</think>\n\nFinal answer.");
        assert_eq!(
            nodes[0].kind(),
            Some(&ElementKind::Think { value: "weighing options".into() })
        );
        assert_eq!(nodes[1].plain_text(), "Final answer.");
    }

    #[test]
    fn think_inside_code_stays_code() {
        let nodes = parse("```html\n<think>plan</think>\n```");
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            nodes[0].kind(),
            Some(&ElementKind::Code { language: Some("html".into()), value: "<think>plan</think>".into() })
        );

        let nodes = parse("Use the `<think>` tag.");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some(&ElementKind::Paragraph));
        let code = nodes[0].children().iter().filter_map(Node::as_text).find(|t| t.marks.code).unwrap();
        assert_eq!(code.text, "<think>");
        assert_eq!(nodes[0].plain_text(), "Use the <think> tag.");
    }

    #[test]
    fn config_comment_attaches_to_next_block() {
        let nodes = parse("<!-- {\"align\":\"center\"} -->\nCentered text");
        assert_eq!(nodes.len(), 1);
        let el = nodes[0].as_element().unwrap();
        assert_eq!(el.align(), Some("center"));
        assert_eq!(nodes[0].plain_text(), "Centered text");
    }

    #[test]
    fn malformed_config_comment_is_ignored() {
        let nodes = parse("<!-- {\"align\": -->\nPlain");
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].as_element().unwrap().props.is_empty());
    }

    #[test]
    fn font_sup_and_br_become_marks() {
        let nodes = parse("<font color=\"red\">warm</font> x<sup>2</sup><br>next");
        let leaves: Vec<&Text> = nodes[0].children().iter().filter_map(Node::as_text).collect();
        assert_eq!(leaves[0].text, "warm");
        assert_eq!(leaves[0].marks.color.as_deref(), Some("red"));
        assert!(leaves.iter().any(|t| t.text == "2" && t.marks.sup));
        assert_eq!(nodes[0].plain_text(), "warm x2\nnext");
    }

    #[test]
    fn allow_listed_tags_starting_a_block_become_marks() {
        let nodes = parse("<font color=\"red\">\nwarm\n</font>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some(&ElementKind::Paragraph));
        let leaf = nodes[0].children()[0].as_text().unwrap();
        assert_eq!(leaf.text, "warm");
        assert_eq!(leaf.marks.color.as_deref(), Some("red"));

        let nodes = parse("<sub>\nlow\n</sub>");
        let leaf = nodes[0].children()[0].as_text().unwrap();
        assert_eq!(leaf.text, "low");
        assert!(leaf.marks.sub);
    }

    #[test]
    fn lone_line_break_block_is_dropped() {
        let nodes = parse("a\n\n<br>\n\nb");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].plain_text(), "a");
        assert_eq!(nodes[1].plain_text(), "b");
        let json = serde_json::to_string(&nodes).unwrap();
        assert!(!json.contains("<br>"));
    }

    #[test]
    fn footnote_reference_keeps_enclosing_marks() {
        let nodes = parse("**a[^1]**\n\n[^1]: note");
        let leaf = nodes[0]
            .children()
            .iter()
            .filter_map(Node::as_text)
            .find(|t| t.marks.footnote.is_some())
            .unwrap();
        assert_eq!(leaf.marks.footnote.as_deref(), Some("1"));
        assert!(leaf.marks.bold);
    }

    #[test]
    fn footnotes_are_collected() {
        let out = MarkdownParser::new().parse("Claim[^1].\n\n[^1]: Source text.");
        assert_eq!(out.footnotes.get("1").map(String::as_str), Some("Source text."));
        let leaf = out.nodes[0]
            .children()
            .iter()
            .filter_map(Node::as_text)
            .find(|t| t.marks.footnote.is_some())
            .unwrap();
        assert_eq!(leaf.text, "1");
    }

    #[test]
    fn ragged_table_rows_are_padded() {
        let nodes = parse("| a | b | c |\n| - | - | - |\n| 1 |");
        let table = &nodes[0];
        assert!(matches!(table.kind(), Some(ElementKind::Table { align }) if align.len() == 3));
        for row in table.children() {
            assert_eq!(row.children().len(), 3);
        }
        assert_eq!(
            table.children()[0].children()[0].kind(),
            Some(&ElementKind::table_cell(true))
        );
    }

    #[test]
    fn marks_stack_through_nesting() {
        let nodes = parse("**bold *both*** and [link](https://x.dev)");
        let leaves: Vec<&Text> = nodes[0].children().iter().filter_map(Node::as_text).collect();
        assert!(leaves[0].marks.bold && !leaves[0].marks.italic);
        assert!(leaves[1].marks.bold && leaves[1].marks.italic);
        let link = leaves.iter().find(|t| t.text == "link").unwrap();
        assert_eq!(link.marks.url.as_deref(), Some("https://x.dev"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let first = FnParseRule::new(
            "shout",
            |n: &MdNode| matches!(n, MdNode::Heading { .. }),
            |_: &MdNode, _: &MarkdownParser| vec![Node::paragraph("FIRST")],
        );
        let second = FnParseRule::new(
            "never",
            |n: &MdNode| matches!(n, MdNode::Heading { .. }),
            |_: &MdNode, _: &MarkdownParser| vec![Node::paragraph("SECOND")],
        );
        let parser = MarkdownParser::with_rules(vec![Arc::new(first), Arc::new(second)]);
        let nodes = parser.parse("# hi").nodes;
        assert_eq!(nodes[0].plain_text(), "FIRST");
    }

    #[test]
    fn empty_input_yields_empty_paragraph() {
        let nodes = parse("");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), Some(&ElementKind::Paragraph));
    }

    #[test]
    fn disabled_extensions_fall_back_to_plain_reading() {
        let options = ParseOptions { gfm: false, footnotes: true, think_tags: false };
        let parser = MarkdownParser::new().with_options(options);

        let nodes = parser.parse("<think>hidden</think> shown").nodes;
        assert_eq!(nodes[0].kind(), Some(&ElementKind::Paragraph));
        assert_eq!(nodes[0].plain_text(), "hidden shown");

        let nodes = parser.parse("~~kept~~").nodes;
        assert_eq!(nodes[0].plain_text(), "~~kept~~");
    }
}
