//! Event Bus
//!
//! Publish-subscribe channel that lets hosts follow what happens to one
//! editor session.

use mdforge_core::Range;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::state::EditorState;

const EVENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The document changed; `version` increases with every change.
    ContentChanged { op: String, version: u64 },
    SelectionChanged(Option<Range>),
    StateChanged { from: EditorState, to: EditorState },
    Focused,
    CommentAdded(Uuid),
    CommentRemoved(Uuid),
    UploadStarted(Uuid),
    UploadFinished { ticket: Uuid, ok: bool },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender: tx }
    }

    /// Dispatches an event to every subscriber. Events published with no
    /// subscriber are dropped.
    pub fn publish(&self, event: EditorEvent) {
        trace!(?event, "Publishing editor event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
