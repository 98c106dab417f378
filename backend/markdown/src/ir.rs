//! Markdown Intermediate Representation
//!
//! Parses markdown syntax (CommonMark + GFM tables, footnotes, strikethrough,
//! task lists) into a strongly-typed mdast tree. The tree is immutable once
//! built; conversion to the editable schema happens in `parser`.

use mdforge_core::CellAlign;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MdNode {
    Root { children: Vec<MdNode> },
    Paragraph { children: Vec<MdNode> },
    Heading { depth: u8, children: Vec<MdNode> },
    ThematicBreak,
    Blockquote { children: Vec<MdNode> },
    List { ordered: bool, start: Option<u64>, spread: bool, children: Vec<MdNode> },
    ListItem { checked: Option<bool>, spread: bool, children: Vec<MdNode> },
    Code { lang: Option<String>, value: String },
    Html { value: String },
    Table { align: Vec<Option<CellAlign>>, children: Vec<MdNode> },
    TableRow { children: Vec<MdNode> },
    TableCell { children: Vec<MdNode> },
    FootnoteDefinition { identifier: String, children: Vec<MdNode> },
    FootnoteReference { identifier: String },
    Text { value: String },
    Emphasis { children: Vec<MdNode> },
    Strong { children: Vec<MdNode> },
    Delete { children: Vec<MdNode> },
    InlineCode { value: String },
    Break,
    Link { url: String, title: Option<String>, children: Vec<MdNode> },
    Image { url: String, title: Option<String>, alt: String },
}

impl MdNode {
    pub fn text(value: impl Into<String>) -> Self {
        MdNode::Text { value: value.into() }
    }

    pub fn html(value: impl Into<String>) -> Self {
        MdNode::Html { value: value.into() }
    }

    pub fn children(&self) -> &[MdNode] {
        match self {
            MdNode::Root { children }
            | MdNode::Paragraph { children }
            | MdNode::Heading { children, .. }
            | MdNode::Blockquote { children }
            | MdNode::List { children, .. }
            | MdNode::ListItem { children, .. }
            | MdNode::Table { children, .. }
            | MdNode::TableRow { children }
            | MdNode::TableCell { children }
            | MdNode::FootnoteDefinition { children, .. }
            | MdNode::Emphasis { children }
            | MdNode::Strong { children }
            | MdNode::Delete { children }
            | MdNode::Link { children, .. } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<MdNode>> {
        match self {
            MdNode::Root { children }
            | MdNode::Paragraph { children }
            | MdNode::Heading { children, .. }
            | MdNode::Blockquote { children }
            | MdNode::List { children, .. }
            | MdNode::ListItem { children, .. }
            | MdNode::Table { children, .. }
            | MdNode::TableRow { children }
            | MdNode::TableCell { children }
            | MdNode::FootnoteDefinition { children, .. }
            | MdNode::Emphasis { children }
            | MdNode::Strong { children }
            | MdNode::Delete { children }
            | MdNode::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Phrasing content in mdast terms.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            MdNode::Text { .. }
                | MdNode::Emphasis { .. }
                | MdNode::Strong { .. }
                | MdNode::Delete { .. }
                | MdNode::InlineCode { .. }
                | MdNode::Break
                | MdNode::Link { .. }
                | MdNode::Image { .. }
                | MdNode::FootnoteReference { .. }
        )
    }

    /// Containers whose direct children are blocks.
    fn holds_blocks(&self) -> bool {
        matches!(
            self,
            MdNode::Root { .. }
                | MdNode::Blockquote { .. }
                | MdNode::ListItem { .. }
                | MdNode::FootnoteDefinition { .. }
        )
    }
}

/// Extensions enabled for every parse.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

pub struct IrParser;

impl IrParser {
    /// Tokenizes and processes standard Markdown into an Intermediate Representation.
    pub fn parse(markdown: &str) -> MdNode {
        Self::parse_with(markdown, parser_options())
    }

    pub fn parse_with(markdown: &str, options: Options) -> MdNode {
        let mut builder = TreeBuilder::new();
        for event in Parser::new_ext(markdown, options) {
            builder.push(event);
        }
        builder.finish()
    }
}

/// Stack machine mapping `pulldown_cmark::Event`s onto nested nodes.
struct TreeBuilder {
    stack: Vec<MdNode>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self { stack: vec![MdNode::Root { children: Vec::new() }] }
    }

    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.append(MdNode::InlineCode { value: code.to_string() }),
            Event::Html(html) => self.push_html(&html),
            Event::FootnoteReference(label) => {
                self.append(MdNode::FootnoteReference { identifier: label.to_string() })
            }
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.append(MdNode::Break),
            Event::Rule => self.append(MdNode::ThematicBreak),
            Event::TaskListMarker(checked) => self.mark_task(checked),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let node = match tag {
            Tag::Paragraph => MdNode::Paragraph { children: Vec::new() },
            Tag::Heading(level, _, _) => MdNode::Heading { depth: level as u8, children: Vec::new() },
            Tag::BlockQuote => MdNode::Blockquote { children: Vec::new() },
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                MdNode::Code { lang, value: String::new() }
            }
            Tag::List(start) => MdNode::List {
                ordered: start.is_some(),
                start,
                spread: false,
                children: Vec::new(),
            },
            Tag::Item => MdNode::ListItem { checked: None, spread: false, children: Vec::new() },
            Tag::FootnoteDefinition(label) => MdNode::FootnoteDefinition {
                identifier: label.to_string(),
                children: Vec::new(),
            },
            Tag::Table(alignments) => MdNode::Table {
                align: alignments.into_iter().map(map_alignment).collect(),
                children: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => MdNode::TableRow { children: Vec::new() },
            Tag::TableCell => MdNode::TableCell { children: Vec::new() },
            Tag::Emphasis => MdNode::Emphasis { children: Vec::new() },
            Tag::Strong => MdNode::Strong { children: Vec::new() },
            Tag::Strikethrough => MdNode::Delete { children: Vec::new() },
            Tag::Link(_, url, title) => MdNode::Link {
                url: url.to_string(),
                title: non_empty(&title),
                children: Vec::new(),
            },
            Tag::Image(_, url, title) => MdNode::Image {
                url: url.to_string(),
                title: non_empty(&title),
                alt: String::new(),
            },
        };
        self.stack.push(node);
    }

    fn close(&mut self, _tag: Tag<'_>) {
        // The root never closes; an unbalanced end event is ignored.
        if self.stack.len() < 2 {
            return;
        }
        let Some(mut node) = self.stack.pop() else {
            return;
        };
        match &mut node {
            MdNode::Code { value, .. } => {
                if value.ends_with('\n') {
                    value.pop();
                }
            }
            MdNode::ListItem { spread, children, .. } => {
                *spread = children.iter().any(|c| matches!(c, MdNode::Paragraph { .. }));
                let taken = std::mem::take(children);
                *children = wrap_phrasing(taken);
            }
            MdNode::List { spread, children, .. } => {
                *spread = children
                    .iter()
                    .any(|c| matches!(c, MdNode::ListItem { spread: true, .. }));
            }
            _ => {}
        }
        self.append(node);
    }

    fn append(&mut self, node: MdNode) {
        if let Some(children) = self.stack.last_mut().and_then(MdNode::children_mut) {
            children.push(node);
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(MdNode::Code { value, .. }) => value.push_str(text),
            Some(MdNode::Image { alt, .. }) => alt.push_str(text),
            Some(top) => {
                if let Some(children) = top.children_mut() {
                    if let Some(MdNode::Text { value }) = children.last_mut() {
                        value.push_str(text);
                    } else {
                        children.push(MdNode::text(text));
                    }
                }
            }
            None => {}
        }
    }

    /// Block-level HTML arrives one line per event; consecutive lines are
    /// joined into one node. Inline HTML stays one node per tag.
    fn push_html(&mut self, html: &str) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        let block_level = top.holds_blocks();
        let Some(children) = top.children_mut() else {
            return;
        };
        if block_level {
            if let Some(MdNode::Html { value }) = children.last_mut() {
                if value.ends_with('\n') {
                    value.push_str(html);
                    return;
                }
            }
        }
        children.push(MdNode::html(html));
    }

    fn mark_task(&mut self, checked: bool) {
        for node in self.stack.iter_mut().rev() {
            if let MdNode::ListItem { checked: slot, .. } = node {
                *slot = Some(checked);
                return;
            }
        }
    }

    fn finish(mut self) -> MdNode {
        while self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.append(node);
            }
        }
        self.stack.pop().unwrap_or(MdNode::Root { children: Vec::new() })
    }
}

/// Block HTML lines keep their line ending; inline tags never have one.
fn is_inline_html(node: &MdNode) -> bool {
    matches!(node, MdNode::Html { value } if !value.ends_with('\n'))
}

fn map_alignment(alignment: Alignment) -> Option<CellAlign> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some(CellAlign::Left),
        Alignment::Center => Some(CellAlign::Center),
        Alignment::Right => Some(CellAlign::Right),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Tight list items hold bare phrasing content; give it a paragraph so
/// every item looks the same downstream.
fn wrap_phrasing(children: Vec<MdNode>) -> Vec<MdNode> {
    let mut out = Vec::with_capacity(children.len());
    let mut run = Vec::new();
    for child in children {
        if child.is_inline() || is_inline_html(&child) {
            run.push(child);
            continue;
        }
        if !run.is_empty() {
            out.push(MdNode::Paragraph { children: std::mem::take(&mut run) });
        }
        out.push(child);
    }
    if !run.is_empty() {
        out.push(MdNode::Paragraph { children: run });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_children(md: &str) -> Vec<MdNode> {
        match IrParser::parse(md) {
            MdNode::Root { children } => children,
            other => panic!("expected root, got {other:?}"),
        }
    }

    #[test]
    fn parses_heading_and_tight_list() {
        let nodes = root_children("# Title\n\n- a\n- b");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            MdNode::Heading { depth: 1, children: vec![MdNode::text("Title")] }
        );
        let MdNode::List { ordered, spread, children, .. } = &nodes[1] else {
            panic!("expected list");
        };
        assert!(!ordered);
        assert!(!spread);
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0],
            MdNode::ListItem {
                checked: None,
                spread: false,
                children: vec![MdNode::Paragraph { children: vec![MdNode::text("a")] }],
            }
        );
    }

    #[test]
    fn code_block_drops_trailing_newline() {
        let nodes = root_children("```rust\nfn main() {}\n```");
        assert_eq!(
            nodes[0],
            MdNode::Code { lang: Some("rust".into()), value: "fn main() {}".into() }
        );
    }

    #[test]
    fn table_head_becomes_first_row() {
        let nodes = root_children("| a | b |\n| :-- | --: |\n| 1 | 2 |");
        let MdNode::Table { align, children } = &nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(align, &vec![Some(CellAlign::Left), Some(CellAlign::Right)]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].children().len(), 2);
    }

    #[test]
    fn task_markers_set_checked() {
        let nodes = root_children("- [x] done\n- [ ] todo");
        let items = nodes[0].children();
        assert!(matches!(items[0], MdNode::ListItem { checked: Some(true), .. }));
        assert!(matches!(items[1], MdNode::ListItem { checked: Some(false), .. }));
    }

    #[test]
    fn inline_html_stays_split() {
        let nodes = root_children("a <sup>2</sup> b");
        let parts = nodes[0].children();
        assert!(parts.iter().any(|n| *n == MdNode::html("<sup>")));
        assert!(parts.iter().any(|n| *n == MdNode::html("</sup>")));
    }

    #[test]
    fn image_collects_alt_text() {
        let nodes = root_children("![a cat](cat.png \"Cat\")");
        assert_eq!(
            nodes[0].children()[0],
            MdNode::Image { url: "cat.png".into(), title: Some("Cat".into()), alt: "a cat".into() }
        );
    }
}
