//! Built-in `card` plugin.
//!
//! A fenced block tagged `card` holding a JSON object becomes a
//! `custom { name: "card" }` element carrying that object, and back.

use mdforge_core::{Element, ElementKind, Node};
use mdforge_markdown::{FnParseRule, FnSerializeRule, MarkdownParser, MarkdownSerializer, MdNode};
use serde_json::Value;
use tracing::warn;

use crate::manifest::PluginManifest;
use crate::plugin::Plugin;

pub const CARD_ELEMENT: &str = "card";

pub fn card_plugin() -> Plugin {
    let mut manifest = PluginManifest::new("card", "Card");
    manifest.description = "Fenced JSON cards rendered as custom elements".to_string();
    manifest.elements = vec![CARD_ELEMENT.to_string()];

    Plugin::new(manifest)
        .with_parse_rule(FnParseRule::new("card-fence", is_card_fence, parse_card))
        .with_serialize_rule(FnSerializeRule::new("card-element", is_card_element, serialize_card))
}

fn is_card_fence(node: &MdNode) -> bool {
    matches!(node, MdNode::Code { lang: Some(lang), .. } if lang == CARD_ELEMENT)
}

fn parse_card(node: &MdNode, _parser: &MarkdownParser) -> Vec<Node> {
    let MdNode::Code { lang, value } = node else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(value) {
        Ok(data) => vec![Element::void(ElementKind::Custom { name: CARD_ELEMENT.to_string(), data }).into()],
        Err(e) => {
            warn!(error = %e, "Card block is not valid JSON, keeping it as code");
            vec![Element::void(ElementKind::Code { language: lang.clone(), value: value.clone() }).into()]
        }
    }
}

fn is_card_element(element: &Element) -> bool {
    matches!(&element.kind, ElementKind::Custom { name, .. } if name == CARD_ELEMENT)
}

fn serialize_card(element: &Element, _serializer: &MarkdownSerializer) -> Vec<MdNode> {
    let ElementKind::Custom { data, .. } = &element.kind else {
        return Vec::new();
    };
    let value = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    vec![MdNode::Code { lang: Some(CARD_ELEMENT.to_string()), value }]
}
