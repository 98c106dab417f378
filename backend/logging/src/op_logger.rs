//! Editor Operation Logger
//!
//! Structured records of applied editor operations, emitted through
//! `tracing` under the [`OPS_TARGET`] target so the JSON file layer writes
//! them as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

pub const OPS_TARGET: &str = "editor_ops";

const DEFAULT_EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorOperation {
    Mutation {
        op: String,
        version: u64,
        blocks: usize,
    },
    TextInserted {
        excerpt: String,
    },
    Replaced {
        search: String,
        replacement: String,
        count: usize,
    },
    History {
        direction: String,
        version: u64,
    },
    Upload {
        ticket: String,
        outcome: String,
    },
    Comment {
        action: String,
        id: String,
        excerpt: String,
    },
}

#[derive(Debug, Serialize)]
pub struct OpLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub operation: EditorOperation,
}

/// Per-session operation logger.
#[derive(Debug, Clone)]
pub struct OperationLogger {
    session_id: String,
    max_excerpt: usize,
}

impl OperationLogger {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), max_excerpt: DEFAULT_EXCERPT_CHARS }
    }

    pub fn with_max_excerpt(mut self, chars: usize) -> Self {
        self.max_excerpt = chars;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Redacts and truncates user text in `operation`, then builds the entry.
    pub fn entry(&self, mut operation: EditorOperation) -> OpLogEntry {
        let clean = |s: &mut String| *s = excerpt(&redact_sensitive_data(s), self.max_excerpt);
        match &mut operation {
            EditorOperation::TextInserted { excerpt } => clean(excerpt),
            EditorOperation::Replaced { search, replacement, .. } => {
                clean(search);
                clean(replacement);
            }
            EditorOperation::Comment { excerpt, .. } => clean(excerpt),
            EditorOperation::Mutation { .. }
            | EditorOperation::History { .. }
            | EditorOperation::Upload { .. } => {}
        }

        OpLogEntry {
            session_id: self.session_id.clone(),
            timestamp: Utc::now(),
            operation,
        }
    }

    pub fn log(&self, operation: EditorOperation) {
        let entry = self.entry(operation);
        info!(target: OPS_TARGET, session = %entry.session_id, event = ?entry, "Editor operation");
    }
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
