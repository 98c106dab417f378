use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Document, Path};

/// A comment bound to a text range inside one leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAnchor {
    pub id: Uuid,
    pub path: Path,
    pub anchor_offset: usize,
    pub focus_offset: usize,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    /// Text covered by the range when the comment was made.
    #[serde(default)]
    pub selection_text: String,
    /// Set once an edit removed or split the anchored text. Orphans never
    /// resolve again, even when a later edit recreates the same path.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub orphaned: bool,
}

impl CommentAnchor {
    pub fn new(
        path: Path,
        anchor_offset: usize,
        focus_offset: usize,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            anchor_offset,
            focus_offset,
            author: author.into(),
            timestamp: Utc::now(),
            content: content.into(),
            selection_text: String::new(),
            orphaned: false,
        }
    }

    /// Character range covered by the anchor, start first.
    pub fn span(&self) -> (usize, usize) {
        (self.anchor_offset.min(self.focus_offset), self.anchor_offset.max(self.focus_offset))
    }

    /// Anchors resolve while they are not orphaned, the path names a text
    /// leaf both offsets fit in, and the covered text still matches
    /// `selection_text` (when one was recorded).
    pub fn resolves_in(&self, doc: &Document) -> bool {
        match self.covered_text(doc) {
            Some(covered) => self.selection_text.is_empty() || covered == self.selection_text,
            None => false,
        }
    }

    /// Text currently under the range, when the anchor is live and fits its leaf.
    pub fn covered_text(&self, doc: &Document) -> Option<String> {
        if self.orphaned {
            return None;
        }
        let text = doc.text(&self.path)?;
        let (start, end) = self.span();
        if end > text.len() {
            return None;
        }
        Some(text.text.chars().skip(start).take(end - start).collect())
    }
}
