//! Markdown conversion for the editor schema
//!
//! Parses CommonMark/GFM (plus `<think>` regions, inline HTML styling and
//! `<!-- {json} -->` block config comments) into schema nodes, and serializes
//! schema nodes back to Markdown. Both directions run through an mdast-style
//! intermediate tree and consult an ordered chain of plugin rules first.

pub mod code_block;
pub mod html;
pub mod ir;
pub mod parser;
pub mod renderer;
pub mod rules;
pub mod serializer;

pub use code_block::{CodeBlockAnalyzer, THINK_LANGUAGE};
pub use ir::{IrParser, MdNode};
pub use parser::{footnote_map, parse_markdown, MarkdownParser, ParseOptions, ParseOutput};
pub use renderer::Renderer;
pub use rules::{FnParseRule, FnSerializeRule, ParseRule, ParseRuleRef, SerializeRule, SerializeRuleRef};
pub use serializer::{to_markdown, MarkdownSerializer};
