use std::fmt;

use serde::{Deserialize, Serialize};

/// Interaction state of an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    #[default]
    Idle,
    /// An IME composition is open; keystrokes are buffered, not committed.
    Composing,
    /// A top-level block is being dragged.
    Dragging,
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditorState::Idle => "idle",
            EditorState::Composing => "composing",
            EditorState::Dragging => "dragging",
        };
        f.write_str(name)
    }
}
