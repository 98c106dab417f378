//! Conversion rules.
//!
//! Rules form an ordered chain: for each node the parser (or serializer)
//! asks every rule in registration order and applies the first that
//! matches. Nodes no rule claims take the built-in conversion.

use std::sync::Arc;

use mdforge_core::{Element, Node};

use crate::ir::MdNode;
use crate::parser::MarkdownParser;
use crate::serializer::MarkdownSerializer;

/// Markdown AST → schema rule.
pub trait ParseRule: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn matches(&self, node: &MdNode) -> bool;

    /// Produce the schema nodes for `node`. `parser` converts nested content
    /// with the full rule chain.
    fn convert(&self, node: &MdNode, parser: &MarkdownParser) -> Vec<Node>;
}

/// Schema → Markdown AST rule.
pub trait SerializeRule: Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, element: &Element) -> bool;

    fn convert(&self, element: &Element, serializer: &MarkdownSerializer) -> Vec<MdNode>;
}

pub type ParseRuleRef = Arc<dyn ParseRule>;
pub type SerializeRuleRef = Arc<dyn SerializeRule>;

/// Parse rule assembled from two closures.
pub struct FnParseRule<M, C> {
    name: String,
    matcher: M,
    converter: C,
}

impl<M, C> FnParseRule<M, C>
where
    M: Fn(&MdNode) -> bool + Send + Sync,
    C: Fn(&MdNode, &MarkdownParser) -> Vec<Node> + Send + Sync,
{
    pub fn new(name: impl Into<String>, matcher: M, converter: C) -> Self {
        Self { name: name.into(), matcher, converter }
    }
}

impl<M, C> ParseRule for FnParseRule<M, C>
where
    M: Fn(&MdNode) -> bool + Send + Sync,
    C: Fn(&MdNode, &MarkdownParser) -> Vec<Node> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, node: &MdNode) -> bool {
        (self.matcher)(node)
    }

    fn convert(&self, node: &MdNode, parser: &MarkdownParser) -> Vec<Node> {
        (self.converter)(node, parser)
    }
}

/// Serialize rule assembled from two closures.
pub struct FnSerializeRule<M, C> {
    name: String,
    matcher: M,
    converter: C,
}

impl<M, C> FnSerializeRule<M, C>
where
    M: Fn(&Element) -> bool + Send + Sync,
    C: Fn(&Element, &MarkdownSerializer) -> Vec<MdNode> + Send + Sync,
{
    pub fn new(name: impl Into<String>, matcher: M, converter: C) -> Self {
        Self { name: name.into(), matcher, converter }
    }
}

impl<M, C> SerializeRule for FnSerializeRule<M, C>
where
    M: Fn(&Element) -> bool + Send + Sync,
    C: Fn(&Element, &MarkdownSerializer) -> Vec<MdNode> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, element: &Element) -> bool {
        (self.matcher)(element)
    }

    fn convert(&self, element: &Element, serializer: &MarkdownSerializer) -> Vec<MdNode> {
        (self.converter)(element, serializer)
    }
}
