//! Editor session store.
//!
//! One store per editor instance. It owns the schema tree, the selection,
//! history and the interaction state machine:
//!
//! ```text
//! Idle ──composition_start──▶ Composing ──composition_end──▶ Idle
//! Idle ──drag_start─────────▶ Dragging  ──drop_at/cancel──▶ Idle
//! ```
//!
//! Every applied mutation is normalized, recorded as one history step,
//! logged to the operation log and published on the event bus. Operations
//! whose paths no longer resolve are no-ops that return `false`.

use std::collections::HashMap;
use std::time::Duration;

use mdforge_config::EditorConfig;
use mdforge_core::{normalize, CommentAnchor, Document, EditorError, Node, Path, Range};
use mdforge_logging::{EditorOperation, OperationLogger};
use mdforge_markdown::{footnote_map, MarkdownParser, MarkdownSerializer};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::comments::CommentList;
use crate::events::{EditorEvent, EventBus};
use crate::history::{History, Snapshot};
use crate::state::EditorState;
use crate::transaction::{inline_position, point_at_inline, range_resolves, Transaction};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub history_limit: usize,
    pub read_only: bool,
    /// Quiet period before change notifications fire.
    pub debounce: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self { history_limit: DEFAULT_HISTORY_LIMIT, read_only: false, debounce: DEFAULT_DEBOUNCE }
    }
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        let defaults = Self::default();
        Self {
            history_limit: config.history_limit.unwrap_or(defaults.history_limit),
            read_only: config.read_only.unwrap_or(defaults.read_only),
            debounce: config.debounce_ms.map(Duration::from_millis).unwrap_or(defaults.debounce),
        }
    }
}

pub struct EditorStore {
    pub(crate) doc: Document,
    pub(crate) selection: Option<Range>,
    state: EditorState,
    composition: String,
    drag_source: Option<usize>,
    focused: bool,
    options: EditorOptions,
    history: History,
    version: u64,
    footnotes: HashMap<String, String>,
    comments: CommentList,
    parser: MarkdownParser,
    serializer: MarkdownSerializer,
    pub(crate) events: EventBus,
    pub(crate) ops: OperationLogger,
}

impl EditorStore {
    pub fn new(options: EditorOptions) -> Self {
        let mut doc = Document::default();
        normalize(&mut doc);
        Self {
            doc,
            selection: None,
            state: EditorState::Idle,
            composition: String::new(),
            drag_source: None,
            focused: false,
            history: History::new(options.history_limit),
            options,
            version: 0,
            footnotes: HashMap::new(),
            comments: CommentList::new(),
            parser: MarkdownParser::new(),
            serializer: MarkdownSerializer::new(),
            events: EventBus::new(),
            ops: OperationLogger::new(Uuid::new_v4().to_string()),
        }
    }

    /// Use plugin-aware converters for the Markdown operations.
    pub fn with_converters(mut self, parser: MarkdownParser, serializer: MarkdownSerializer) -> Self {
        self.parser = parser;
        self.serializer = serializer;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Text buffered by an open composition.
    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn drag_source(&self) -> Option<usize> {
        self.drag_source
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn footnotes(&self) -> &HashMap<String, String> {
        &self.footnotes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    // -- content -----------------------------------------------------------

    pub fn get_content(&self) -> Vec<Node> {
        self.doc.children.clone()
    }

    pub fn set_content(&mut self, nodes: Vec<Node>) -> bool {
        self.commit("set_content", |tx| tx.set_content(nodes)).is_some()
    }

    pub fn get_markdown(&self) -> String {
        self.serializer.serialize(&self.doc.children)
    }

    pub fn set_markdown(&mut self, markdown: &str) -> bool {
        let output = self.parser.parse(markdown);
        self.commit("set_markdown", |tx| tx.set_content(output.nodes)).is_some()
    }

    pub fn insert_nodes(&mut self, path: &[usize], nodes: Vec<Node>) -> bool {
        self.commit("insert_nodes", |tx| tx.insert_nodes(path, nodes)).unwrap_or(false)
    }

    pub fn remove_node(&mut self, path: &[usize]) -> bool {
        self.commit("remove_node", |tx| tx.remove_node(path)).unwrap_or(false)
    }

    /// Replace the first (or every) occurrence of `search`; returns the count.
    pub fn replace_text(&mut self, search: &str, replacement: &str, all: bool) -> usize {
        let count = self
            .commit("replace_text", |tx| tx.replace_text(search, replacement, all))
            .unwrap_or(0);
        if count > 0 {
            self.ops.log(EditorOperation::Replaced {
                search: search.to_string(),
                replacement: replacement.to_string(),
                count,
            });
        }
        count
    }

    pub fn insert_link(&mut self, range: &Range, url: &str) -> bool {
        self.commit("insert_link", |tx| tx.insert_link(range, url)).unwrap_or(false)
    }

    pub fn delete_selection(&mut self) -> bool {
        self.commit("delete_selection", |tx| tx.delete_selection()).unwrap_or(false)
    }

    /// Reset to a single empty paragraph.
    pub fn clear_content(&mut self) -> bool {
        self.commit("clear_content", |tx| tx.clear()).is_some()
    }

    /// Several edits as one history step; normalization runs once at the end.
    /// `None` when the editor is read-only.
    pub fn batch<R>(&mut self, edits: impl FnOnce(&mut Transaction<'_>) -> R) -> Option<R> {
        self.commit("batch", edits)
    }

    // -- selection and focus -----------------------------------------------

    pub fn select(&mut self, range: Range) -> bool {
        if !range_resolves(&self.doc, &range) {
            debug!(?range, "Ignoring selection outside the document");
            return false;
        }
        self.selection = Some(range);
        self.events.publish(EditorEvent::SelectionChanged(self.selection.clone()));
        true
    }

    /// Focus the editor with the caret at the end of the document.
    pub fn focus(&mut self) {
        self.focused = true;
        self.selection = self.doc.end_point().map(Range::collapsed);
        self.events.publish(EditorEvent::Focused);
        self.events.publish(EditorEvent::SelectionChanged(self.selection.clone()));
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    // -- keystrokes and composition ----------------------------------------

    /// A keystroke. Buffered while composing; otherwise committed at the
    /// selection (ending a drag first).
    pub fn insert_text(&mut self, text: &str) -> bool {
        match self.state {
            EditorState::Composing => {
                self.composition.push_str(text);
                true
            }
            EditorState::Dragging => {
                self.drag_source = None;
                self.set_state(EditorState::Idle);
                self.commit_text(text)
            }
            EditorState::Idle => self.commit_text(text),
        }
    }

    fn commit_text(&mut self, text: &str) -> bool {
        let applied = self.commit("insert_text", |tx| tx.insert_text(text)).unwrap_or(false);
        if applied {
            self.ops.log(EditorOperation::TextInserted { excerpt: text.to_string() });
        }
        applied
    }

    pub fn composition_start(&mut self) -> bool {
        if self.state != EditorState::Idle {
            debug!(state = %self.state, "composition_start ignored");
            return false;
        }
        self.composition.clear();
        self.set_state(EditorState::Composing);
        true
    }

    /// Replace the buffered composition text.
    pub fn composition_update(&mut self, text: &str) -> bool {
        if self.state != EditorState::Composing {
            return false;
        }
        self.composition = text.to_string();
        true
    }

    /// Close the composition and commit `text` (the buffer when empty).
    pub fn composition_end(&mut self, text: &str) -> bool {
        if self.state != EditorState::Composing {
            debug!(state = %self.state, "composition_end ignored");
            return false;
        }
        let buffered = std::mem::take(&mut self.composition);
        self.set_state(EditorState::Idle);
        let text = if text.is_empty() { buffered } else { text.to_string() };
        if text.is_empty() {
            return true;
        }
        self.commit_text(&text)
    }

    // -- drag and drop -----------------------------------------------------

    /// Start dragging the top-level block at `path`.
    pub fn drag_start(&mut self, path: &[usize]) -> bool {
        if self.state != EditorState::Idle || self.options.read_only {
            debug!(state = %self.state, "drag_start ignored");
            return false;
        }
        let [index] = path else {
            debug!(?path, "Only top-level blocks can be dragged");
            return false;
        };
        if *index >= self.doc.children.len() {
            debug!(?path, "Stale drag path, ignoring");
            return false;
        }
        self.drag_source = Some(*index);
        self.set_state(EditorState::Dragging);
        true
    }

    /// Drop the dragged block before the block currently at `index`.
    pub fn drop_at(&mut self, index: usize) -> bool {
        if self.state != EditorState::Dragging {
            debug!(state = %self.state, "drop_at ignored");
            return false;
        }
        let source = self.drag_source.take();
        self.set_state(EditorState::Idle);
        match source {
            Some(from) => self.commit("move_block", |tx| tx.move_block(from, index)).unwrap_or(false),
            None => false,
        }
    }

    pub fn cancel_drag(&mut self) -> bool {
        if self.state != EditorState::Dragging {
            return false;
        }
        self.drag_source = None;
        self.set_state(EditorState::Idle);
        true
    }

    fn set_state(&mut self, to: EditorState) {
        if self.state == to {
            return;
        }
        let from = std::mem::replace(&mut self.state, to);
        debug!(%from, %to, "Editor state changed");
        self.events.publish(EditorEvent::StateChanged { from, to });
    }

    // -- history -----------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.step_history("undo")
    }

    pub fn redo(&mut self) -> bool {
        self.step_history("redo")
    }

    fn step_history(&mut self, direction: &str) -> bool {
        if self.state != EditorState::Idle || self.options.read_only {
            debug!(state = %self.state, direction, "History step ignored");
            return false;
        }
        let current = self.snapshot();
        let restored = if direction == "undo" {
            self.history.undo(current)
        } else {
            self.history.redo(current)
        };
        let Some(snapshot) = restored else {
            return false;
        };
        self.doc = snapshot.document;
        self.selection = snapshot.selection;
        self.comments.restore_positions(&snapshot.comments);
        self.content_changed(direction);
        self.ops.log(EditorOperation::History { direction: direction.to_string(), version: self.version });
        true
    }

    // -- comments ----------------------------------------------------------

    pub fn comments(&self) -> &CommentList {
        &self.comments
    }

    pub fn active_comments(&self) -> Vec<&CommentAnchor> {
        self.comments.active(&self.doc)
    }

    pub fn orphaned_comments(&self) -> Vec<&CommentAnchor> {
        self.comments.orphaned(&self.doc)
    }

    /// Build an anchor over the current selection, which must lie in one text leaf.
    pub fn comment_anchor(&self, author: &str, content: &str) -> Result<CommentAnchor, EditorError> {
        let Some(range) = &self.selection else {
            return Err(EditorError::InvalidNode("comment needs a selection".to_string()));
        };
        if range.anchor.path != range.focus.path {
            return Err(EditorError::InvalidNode("comment selection spans several text leaves".to_string()));
        }
        let mut anchor = CommentAnchor::new(
            range.anchor.path.clone(),
            range.anchor.offset,
            range.focus.offset,
            author,
            content,
        );
        anchor.selection_text = anchor
            .covered_text(&self.doc)
            .ok_or_else(|| EditorError::InvalidPath(range.anchor.path.clone()))?;
        Ok(anchor)
    }

    pub fn add_comment(&mut self, anchor: CommentAnchor) {
        let id = anchor.id;
        self.ops.log(EditorOperation::Comment {
            action: "add".to_string(),
            id: id.to_string(),
            excerpt: anchor.content.clone(),
        });
        self.comments.add(anchor);
        self.events.publish(EditorEvent::CommentAdded(id));
    }

    pub fn remove_comment(&mut self, id: Uuid) -> Option<CommentAnchor> {
        let removed = self.comments.remove(id)?;
        self.events.publish(EditorEvent::CommentRemoved(id));
        Some(removed)
    }

    // -- commit pipeline ---------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.doc.clone(),
            selection: self.selection.clone(),
            comments: self.comments.clone(),
        }
    }

    /// Run `edit` in a transaction. When it changed the document, normalize,
    /// keep the selection and comment anchors on the same text, record one
    /// history step and announce the change. `None` when the editor is
    /// read-only.
    pub(crate) fn commit<R>(&mut self, op: &str, edit: impl FnOnce(&mut Transaction<'_>) -> R) -> Option<R> {
        if self.options.read_only {
            debug!(op, "Editor is read-only, ignoring");
            return None;
        }
        let before = self.snapshot();
        let (result, changed) = {
            let mut tx = Transaction::new(&mut self.doc, &mut self.selection).with_comments(&mut self.comments);
            let result = edit(&mut tx);
            (result, tx.changed())
        };

        if changed {
            self.normalize_keeping_selection();
            self.history.record(before);
            self.content_changed(op);
        } else if self.selection != before.selection {
            self.events.publish(EditorEvent::SelectionChanged(self.selection.clone()));
        }
        Some(result)
    }

    fn normalize_keeping_selection(&mut self) {
        let positions = self.selection.as_ref().map(|range| {
            (inline_position(&self.doc, &range.anchor), inline_position(&self.doc, &range.focus))
        });
        let spans = self.comments.inline_spans(&self.doc);
        normalize(&mut self.doc);
        self.comments.rebind(&self.doc, spans);

        let Some((anchor, focus)) = positions else {
            return;
        };
        let restore = |position: Option<(Path, usize)>| {
            position.and_then(|(parent, offset)| point_at_inline(&self.doc, &parent, offset))
        };
        self.selection = match (restore(anchor), restore(focus)) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
            _ => self.doc.end_point().map(Range::collapsed),
        };
    }

    fn content_changed(&mut self, op: &str) {
        self.version += 1;
        self.footnotes = footnote_map(&self.doc.children);
        self.ops.log(EditorOperation::Mutation {
            op: op.to_string(),
            version: self.version,
            blocks: self.doc.children.len(),
        });
        self.events.publish(EditorEvent::ContentChanged { op: op.to_string(), version: self.version });
    }
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdforge_core::{ElementKind, Point};

    fn store(md: &str) -> EditorStore {
        let mut store = EditorStore::default();
        store.set_markdown(md);
        store
    }

    fn caret(path: Path, offset: usize) -> Range {
        Range::collapsed(Point::new(path, offset))
    }

    #[test]
    fn starts_with_one_empty_paragraph() {
        let store = EditorStore::default();
        assert_eq!(store.document().children.len(), 1);
        assert_eq!(store.state(), EditorState::Idle);
        assert_eq!(store.get_markdown(), "");
    }

    #[test]
    fn markdown_round_trip_through_store() {
        let store = store("# Title\n\n- a\n- b");
        assert_eq!(store.get_markdown(), "# Title\n\n- a\n- b");
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn keystroke_commits_and_focus_moves_caret_to_end() {
        let mut store = store("Hello");
        store.focus();
        assert!(store.is_focused());
        assert_eq!(store.selection(), Some(&caret(vec![0, 0], 5)));
        assert!(store.insert_text("!"));
        assert_eq!(store.get_markdown(), "Hello!");
    }

    #[test]
    fn composition_buffers_until_end() {
        let mut store = store("ab");
        store.focus();
        assert!(store.composition_start());
        assert_eq!(store.state(), EditorState::Composing);
        assert!(store.insert_text("ni"));
        assert!(store.composition_update("你"));
        assert_eq!(store.get_markdown(), "ab");
        assert_eq!(store.composition(), "你");

        assert!(store.composition_end(""));
        assert_eq!(store.state(), EditorState::Idle);
        assert_eq!(store.get_markdown(), "ab你");
        assert!(!store.composition_end("x"));
    }

    #[test]
    fn drag_moves_top_level_block() {
        let mut store = store("one\n\ntwo\n\nthree");
        assert!(!store.drop_at(0));
        assert!(!store.drag_start(&[0, 0]));
        assert!(store.drag_start(&[2]));
        assert_eq!(store.state(), EditorState::Dragging);
        assert!(!store.composition_start());
        assert!(store.drop_at(0));
        assert_eq!(store.state(), EditorState::Idle);
        assert_eq!(store.get_markdown(), "three\n\none\n\ntwo");

        assert!(store.drag_start(&[0]));
        assert!(store.cancel_drag());
        assert_eq!(store.get_markdown(), "three\n\none\n\ntwo");
    }

    #[test]
    fn stale_paths_are_no_ops() {
        let mut store = store("only");
        let version = store.version();
        assert!(!store.insert_nodes(&[0, 5, 1], vec![Node::text("x")]));
        assert!(!store.remove_node(&[9]));
        assert!(!store.select(caret(vec![3, 0], 0)));
        assert!(!store.drag_start(&[4]));
        assert_eq!(store.version(), version);
        assert!(!store.history().can_redo());
    }

    #[test]
    fn undo_redo_restore_content() {
        let mut store = store("first");
        store.insert_nodes(&[1], vec![Node::paragraph("second")]);
        assert_eq!(store.get_markdown(), "first\n\nsecond");

        assert!(store.undo());
        assert_eq!(store.get_markdown(), "first");
        assert!(store.redo());
        assert_eq!(store.get_markdown(), "first\n\nsecond");
        assert!(!store.redo());
    }

    #[test]
    fn history_is_bounded() {
        let options = EditorOptions { history_limit: 2, ..EditorOptions::default() };
        let mut store = EditorStore::new(options);
        for md in ["a", "b", "c", "d"] {
            store.set_markdown(md);
        }
        assert!(store.undo());
        assert!(store.undo());
        assert!(!store.undo());
        assert_eq!(store.get_markdown(), "b");
    }

    #[test]
    fn batch_is_one_history_step() {
        let mut store = store("alpha beta");
        let count = store
            .batch(|tx| {
                tx.insert_nodes(&[1], vec![Node::paragraph("gamma")]);
                tx.replace_text("a", "A", true)
            })
            .unwrap();
        assert_eq!(count, 5);
        assert_eq!(store.get_markdown(), "AlphA betA\n\ngAmmA");
        assert!(store.undo());
        assert_eq!(store.get_markdown(), "alpha beta");
    }

    #[test]
    fn replace_text_counts() {
        let mut store = store("a cat, a hat");
        assert_eq!(store.replace_text("at", "og", false), 1);
        assert_eq!(store.replace_text("at", "og", true), 1);
        assert_eq!(store.replace_text("", "x", true), 0);
        assert_eq!(store.get_markdown(), "a cog, a hog");
    }

    #[test]
    fn insert_link_marks_range() {
        let mut store = store("see docs here");
        let range = Range::new(Point::new(vec![0, 0], 4), Point::new(vec![0, 0], 8));
        assert!(store.insert_link(&range, "https://docs.rs"));
        assert_eq!(store.get_markdown(), "see [docs](https://docs.rs) here");
        assert!(!store.insert_link(&caret(vec![0, 0], 1), "https://x.dev"));
    }

    #[test]
    fn clear_leaves_empty_paragraph() {
        let mut store = store("# gone\n\ntext");
        assert!(store.clear_content());
        assert_eq!(store.document().children.len(), 1);
        assert_eq!(store.document().children[0].kind(), Some(&ElementKind::Paragraph));
        assert_eq!(store.get_markdown(), "");
    }

    #[test]
    fn read_only_rejects_mutations() {
        let options = EditorOptions { read_only: true, ..EditorOptions::default() };
        let mut store = EditorStore::new(options);
        assert!(!store.set_markdown("nope"));
        assert!(!store.insert_text("x"));
        assert_eq!(store.replace_text("a", "b", true), 0);
        assert!(store.batch(|_| ()).is_none());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn selection_survives_leaf_merge() {
        let mut store = store("**bold** tail");
        store.select(caret(vec![0, 1], 2));
        // The inserted plain leaf merges with the one holding the caret.
        assert!(store.insert_nodes(&[0, 1], vec![Node::text("!")]));
        assert_eq!(store.document().children[0].children().len(), 2);
        assert_eq!(store.selection(), Some(&caret(vec![0, 1], 3)));
        assert_eq!(store.get_markdown(), "**bold**! tail");
    }

    #[test]
    fn footnotes_track_document() {
        let mut store = store("Text[^a].\n\n[^a]: Source.");
        assert_eq!(store.footnotes().get("a").map(String::as_str), Some("Source."));
        store.clear_content();
        assert!(store.footnotes().is_empty());
    }

    #[test]
    fn comments_orphan_after_block_removal() {
        let mut store = store("keep\n\ndrop me");
        store.select(Range::new(Point::new(vec![1, 0], 0), Point::new(vec![1, 0], 4)));
        let anchor = store.comment_anchor("ann", "why?").unwrap();
        assert_eq!(anchor.selection_text, "drop");
        store.add_comment(anchor);
        assert_eq!(store.active_comments().len(), 1);

        store.remove_node(&[1]);
        assert!(store.active_comments().is_empty());
        assert_eq!(store.orphaned_comments().len(), 1);
    }

    #[test]
    fn comments_follow_inserted_blocks() {
        let mut store = store("alpha\n\nbravo");
        store.select(Range::new(Point::new(vec![1, 0], 0), Point::new(vec![1, 0], 5)));
        let anchor = store.comment_anchor("ann", "check").unwrap();
        store.add_comment(anchor);

        assert!(store.insert_nodes(&[0], vec![Node::paragraph("zulu!")]));
        let active = store.active_comments();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].path, vec![2, 0]);
        assert_eq!(active[0].covered_text(store.document()).as_deref(), Some("bravo"));
    }

    #[test]
    fn comments_survive_leaf_merges_and_undo() {
        let mut store = store("one **two** three");
        let leaves = store.document().children[0].children().len();
        assert_eq!(leaves, 3);
        store.select(Range::new(Point::new(vec![0, 2], 1), Point::new(vec![0, 2], 6)));
        let anchor = store.comment_anchor("ann", "x").unwrap();
        assert_eq!(anchor.selection_text, "three");
        store.add_comment(anchor);

        let bold = Range::new(Point::new(vec![0, 1], 0), Point::new(vec![0, 1], 3));
        assert_eq!(store.commit("unbold", |tx| tx.set_marks(&bold, |m| m.bold = false)), Some(true));
        assert_eq!(store.document().children[0].children().len(), 1);
        let active = store.active_comments();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].path, vec![0, 0]);
        assert_eq!(active[0].covered_text(store.document()).as_deref(), Some("three"));

        assert!(store.remove_node(&[0]));
        assert_eq!(store.orphaned_comments().len(), 1);
        assert!(store.undo());
        assert_eq!(store.active_comments().len(), 1);
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let mut store = EditorStore::default();
        let mut rx = store.subscribe();
        store.set_markdown("hi");
        store.drag_start(&[0]);

        assert_eq!(rx.recv().await.unwrap(), EditorEvent::ContentChanged { op: "set_markdown".into(), version: 1 });
        assert_eq!(
            rx.recv().await.unwrap(),
            EditorEvent::StateChanged { from: EditorState::Idle, to: EditorState::Dragging }
        );
    }

    #[test]
    fn options_from_config() {
        let config = EditorConfig { history_limit: Some(5), debounce_ms: Some(40), read_only: None };
        let options = EditorOptions::from(&config);
        assert_eq!(options.history_limit, 5);
        assert_eq!(options.debounce, Duration::from_millis(40));
        assert!(!options.read_only);
    }
}
