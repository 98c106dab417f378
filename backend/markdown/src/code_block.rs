//! Code Block Utility
//!
//! Fence sizing for code spans and blocks, and code-block extraction from a
//! schema tree.

use mdforge_core::{ElementKind, Node};

/// Info string used to carry `<think>` content through the Markdown parser.
pub const THINK_LANGUAGE: &str = "think";

pub struct CodeBlockAnalyzer;

impl CodeBlockAnalyzer {
    /// Backtick fence long enough that `content` cannot close it (at least three).
    pub fn fence_for(content: &str) -> String {
        "`".repeat((Self::longest_backtick_run(content) + 1).max(3))
    }

    /// Delimiter for an inline code span around `content`.
    pub fn span_fence_for(content: &str) -> String {
        "`".repeat(Self::longest_backtick_run(content) + 1)
    }

    pub fn longest_backtick_run(content: &str) -> usize {
        let mut longest = 0;
        let mut current = 0;
        for c in content.chars() {
            if c == '`' {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// Extracts all code blocks (language, content) from a schema tree.
    pub fn extract_blocks(nodes: &[Node]) -> Vec<(Option<String>, String)> {
        let mut blocks = Vec::new();
        for node in nodes {
            if let Some(ElementKind::Code { language, value }) = node.kind() {
                blocks.push((language.clone(), value.clone()));
            }
            blocks.extend(Self::extract_blocks(node.children()));
        }
        blocks
    }
}
