//! Editable document schema.
//!
//! The schema tree is what the editor mutates: block and inline elements
//! with ordered children, and text leaves carrying formatting marks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

fn is_false(value: &bool) -> bool {
    !*value
}

/// Formatting carried by a text leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sup: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sub: bool,
    /// Link target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Text color from a `<font color>` wrapper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Footnote reference identifier; the leaf text holds the identifier too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote: Option<String>,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

/// A run of text with uniform marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), marks: Marks::default() }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self { text: text.into(), marks }
    }

    /// Length in chars, which is the unit selection offsets use.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// Column or cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellAlign {
    Left,
    Center,
    Right,
}

fn one() -> u32 {
    1
}

/// Element type tag plus its type-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    Heading {
        level: u8,
    },
    List {
        ordered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        #[serde(default)]
        loose: bool,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    Blockquote,
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        value: String,
    },
    /// Model reasoning captured from a `<think>` block.
    Think {
        value: String,
    },
    Table {
        #[serde(default)]
        align: Vec<Option<CellAlign>>,
    },
    TableRow,
    TableCell {
        #[serde(default)]
        header: bool,
        #[serde(default = "one")]
        rowspan: u32,
        #[serde(default = "one")]
        colspan: u32,
    },
    Hr,
    /// Raw HTML kept as-is (allow-listed block markup such as tables).
    Html {
        value: String,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    FootnoteDefinition {
        identifier: String,
    },
    /// Plugin-defined node type; `name` selects the host renderer.
    Custom {
        name: String,
        #[serde(default)]
        data: Value,
    },
}

impl ElementKind {
    pub fn table_cell(header: bool) -> Self {
        ElementKind::TableCell { header, rowspan: 1, colspan: 1 }
    }

    /// Type tag as it appears in serialized JSON.
    pub fn type_name(&self) -> &str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::Heading { .. } => "heading",
            ElementKind::List { .. } => "list",
            ElementKind::ListItem { .. } => "list-item",
            ElementKind::Blockquote => "blockquote",
            ElementKind::Code { .. } => "code",
            ElementKind::Think { .. } => "think",
            ElementKind::Table { .. } => "table",
            ElementKind::TableRow => "table-row",
            ElementKind::TableCell { .. } => "table-cell",
            ElementKind::Hr => "hr",
            ElementKind::Html { .. } => "html",
            ElementKind::Image { .. } => "image",
            ElementKind::FootnoteDefinition { .. } => "footnote-definition",
            ElementKind::Custom { name, .. } => name,
        }
    }

    /// Void elements never hold children.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            ElementKind::Code { .. }
                | ElementKind::Think { .. }
                | ElementKind::Hr
                | ElementKind::Html { .. }
                | ElementKind::Image { .. }
                | ElementKind::Custom { .. }
        )
    }

    /// Elements whose children are inline content (text leaves, images).
    pub fn holds_inline(&self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph | ElementKind::Heading { .. } | ElementKind::TableCell { .. }
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ElementKind::Image { .. })
    }
}

/// A schema element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Block configuration attached through `<!-- {json} -->` comments.
    #[serde(default, rename = "otherProps", skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self { kind, children, props: Map::new() }
    }

    pub fn void(kind: ElementKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(ElementKind::Paragraph, children)
    }

    pub fn empty_paragraph() -> Self {
        Self::paragraph(vec![Node::Text(Text::default())])
    }

    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
    }

    /// Alignment requested through block configuration, if any.
    pub fn align(&self) -> Option<&str> {
        self.props.get("align").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Either an element or a text leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn element(kind: ElementKind, children: Vec<Node>) -> Self {
        Node::Element(Element::new(kind, children))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Element(Element::paragraph(vec![Node::text(text)]))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Text leaves and inline elements.
    pub fn is_inline(&self) -> bool {
        match self {
            Node::Text(_) => true,
            Node::Element(el) => el.kind.is_inline(),
        }
    }

    pub fn kind(&self) -> Option<&ElementKind> {
        self.as_element().map(|el| &el.kind)
    }

    /// Concatenated text content, the way a renderer would show it.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&t.text),
        Node::Element(el) => match &el.kind {
            ElementKind::Code { value, .. }
            | ElementKind::Think { value }
            | ElementKind::Html { value } => out.push_str(value),
            ElementKind::Image { alt, .. } => out.push_str(alt),
            _ => {
                for child in &el.children {
                    collect_text(child, out);
                }
            }
        },
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Text> for Node {
    fn from(t: Text) -> Self {
        Node::Text(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_json_uses_type_tag() {
        let node = Node::element(ElementKind::Heading { level: 2 }, vec![Node::text("Hi")]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
        assert_eq!(json["children"][0]["text"], "Hi");
    }

    #[test]
    fn json_round_trip_keeps_marks_and_props() {
        let mut props = Map::new();
        props.insert("align".into(), Value::String("center".into()));
        let leaf = Text::with_marks("bold", Marks { bold: true, ..Default::default() });
        let node: Node = Element::paragraph(vec![leaf.into()]).with_props(props).into();

        let raw = serde_json::to_string(&node).unwrap();
        assert!(raw.contains("otherProps"));
        let back: Node = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.as_element().unwrap().align(), Some("center"));
    }

    #[test]
    fn leaf_json_deserializes_as_text() {
        let node: Node = serde_json::from_str(r#"{"text":"x","italic":true}"#).unwrap();
        let text = node.as_text().unwrap();
        assert!(text.marks.italic);
        assert!(!text.marks.bold);
    }

    #[test]
    fn plain_text_flattens_children() {
        let node = Node::element(
            ElementKind::Blockquote,
            vec![Node::paragraph("a"), Node::paragraph("b")],
        );
        assert_eq!(node.plain_text(), "ab");
    }

    #[test]
    fn void_and_inline_classification() {
        assert!(ElementKind::Hr.is_void());
        assert!(!ElementKind::Paragraph.is_void());
        let img = ElementKind::Image { url: "u".into(), alt: String::new(), title: None };
        assert!(img.is_inline());
        assert!(ElementKind::table_cell(false).holds_inline());
    }
}
