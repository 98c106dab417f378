//! Comment anchors tracked against the document.
//!
//! Edits carry anchors along: structural edits rewrite their paths, text
//! edits shift their offsets and leaf splits or merges rebind them through
//! inline positions. An anchor whose text was removed, or which no longer
//! fits one leaf, is orphaned. It is never moved onto other text. Orphans
//! stay in the list until the host deletes them.

use std::sync::Arc;

use async_trait::async_trait;
use mdforge_core::{CommentAnchor, Document, EditorError, Path, Point};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::inflight::InFlight;
use crate::store::EditorStore;
use crate::transaction::{inline_position, span_at_inline};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentList {
    anchors: Vec<CommentAnchor>,
}

impl CommentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, anchor: CommentAnchor) {
        self.anchors.push(anchor);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<CommentAnchor> {
        let index = self.anchors.iter().position(|a| a.id == id)?;
        Some(self.anchors.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&CommentAnchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &[CommentAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchors whose path still names a text leaf their offsets fit in.
    pub fn active<'a>(&'a self, doc: &Document) -> Vec<&'a CommentAnchor> {
        self.anchors.iter().filter(|a| a.resolves_in(doc)).collect()
    }

    pub fn orphaned<'a>(&'a self, doc: &Document) -> Vec<&'a CommentAnchor> {
        self.anchors.iter().filter(|a| !a.resolves_in(doc)).collect()
    }

    fn live(&mut self) -> impl Iterator<Item = &mut CommentAnchor> {
        self.anchors.iter_mut().filter(|a| !a.orphaned)
    }

    /// Send both ends of every live anchor through `map`. Anchors whose ends
    /// vanish or land in different leaves are orphaned.
    pub(crate) fn map_anchors(&mut self, map: impl Fn(&Point) -> Option<Point>) {
        for anchor in self.live() {
            let ends = (
                map(&Point::new(anchor.path.clone(), anchor.anchor_offset)),
                map(&Point::new(anchor.path.clone(), anchor.focus_offset)),
            );
            match ends {
                (Some(a), Some(f)) if a.path == f.path => {
                    anchor.path = a.path;
                    anchor.anchor_offset = a.offset;
                    anchor.focus_offset = f.offset;
                }
                _ => orphan(anchor),
            }
        }
    }

    /// `count` characters were typed at `at` in the leaf at `path`. Text
    /// typed at an anchor's start pushes it right; text typed at its end
    /// stays outside.
    pub(crate) fn shift_for_typing(&mut self, path: &[usize], at: usize, count: usize) {
        for anchor in self.live().filter(|a| a.path == path) {
            let (start, end) = anchor.span();
            let moved_start = if start >= at { start + count } else { start };
            let moved_end = if end > at || (end == at && start == end) { end + count } else { end };
            set_span(anchor, moved_start, moved_end);
        }
    }

    pub(crate) fn orphan_all(&mut self) {
        self.live().for_each(orphan);
    }

    /// Inline spans of the live anchors, to rebind them once leaves were
    /// split or merged.
    pub(crate) fn inline_spans(&self, doc: &Document) -> Vec<InlineSpan> {
        self.anchors
            .iter()
            .filter(|a| !a.orphaned)
            .map(|a| {
                let (start, end) = a.span();
                let position = inline_position(doc, &Point::new(a.path.clone(), start));
                InlineSpan { id: a.id, position, len: end - start }
            })
            .collect()
    }

    pub(crate) fn rebind(&mut self, doc: &Document, spans: Vec<InlineSpan>) {
        for span in spans {
            let Some(anchor) = self.anchors.iter_mut().find(|a| a.id == span.id) else {
                continue;
            };
            let located = span
                .position
                .and_then(|(parent, offset)| span_at_inline(doc, &parent, offset, span.len));
            match located {
                Some(point) => {
                    anchor.path = point.path;
                    set_span(anchor, point.offset, point.offset + span.len);
                }
                None => orphan(anchor),
            }
        }
    }

    /// Put anchors back where `saved` had them, for undo and redo. Anchors
    /// added since then are left as they are.
    pub(crate) fn restore_positions(&mut self, saved: &CommentList) {
        for anchor in &mut self.anchors {
            if let Some(old) = saved.get(anchor.id) {
                anchor.path = old.path.clone();
                anchor.anchor_offset = old.anchor_offset;
                anchor.focus_offset = old.focus_offset;
                anchor.orphaned = old.orphaned;
            }
        }
    }
}

/// Where a live anchor started, as (parent path, offset across its text
/// children), and how many characters it covers.
#[derive(Debug, Clone)]
pub(crate) struct InlineSpan {
    id: Uuid,
    position: Option<(Path, usize)>,
    len: usize,
}

fn orphan(anchor: &mut CommentAnchor) {
    debug!(id = %anchor.id, path = ?anchor.path, "Comment anchor orphaned");
    anchor.orphaned = true;
}

/// Keep the anchor's direction while moving its ends.
fn set_span(anchor: &mut CommentAnchor, start: usize, end: usize) {
    if anchor.anchor_offset <= anchor.focus_offset {
        anchor.anchor_offset = start;
        anchor.focus_offset = end;
    } else {
        anchor.anchor_offset = end;
        anchor.focus_offset = start;
    }
}

/// Host-side persistence for comments.
#[async_trait]
pub trait CommentHandler: Send + Sync {
    async fn on_submit(&self, comment: &CommentAnchor) -> anyhow::Result<()>;
    async fn on_delete(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Drives a [`CommentHandler`] for one editor, one request of each kind at a time.
pub struct CommentSession {
    handler: Arc<dyn CommentHandler>,
    submitting: InFlight,
    deleting: InFlight,
}

impl CommentSession {
    pub fn new(handler: Arc<dyn CommentHandler>) -> Self {
        Self { handler, submitting: InFlight::new(), deleting: InFlight::new() }
    }

    /// Anchor a comment on the current selection and hand it to the host.
    /// Returns `Ok(None)` when a submit is already in flight; the comment is
    /// added to the store only once the host accepted it.
    pub async fn submit_comment(
        &self,
        store: &Mutex<EditorStore>,
        author: &str,
        content: &str,
    ) -> Result<Option<CommentAnchor>, EditorError> {
        let anchor = store.lock().await.comment_anchor(author, content)?;
        let Some(outcome) = self.submitting.run(self.handler.on_submit(&anchor)).await else {
            debug!("Comment submit already in flight");
            return Ok(None);
        };
        outcome?;
        store.lock().await.add_comment(anchor.clone());
        Ok(Some(anchor))
    }

    /// Ask the host to delete a comment, then drop it from the store.
    /// Returns whether the store held it.
    pub async fn delete_comment(&self, store: &Mutex<EditorStore>, id: Uuid) -> Result<bool, EditorError> {
        let Some(outcome) = self.deleting.run(self.handler.on_delete(id)).await else {
            debug!(%id, "Comment delete already in flight");
            return Ok(false);
        };
        outcome?;
        Ok(store.lock().await.remove_comment(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EditorOptions;
    use mdforge_core::{Node, Point, Range};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn doc() -> Document {
        Document::new(vec![Node::paragraph("first"), Node::paragraph("second")])
    }

    #[test]
    fn anchor_goes_orphan_when_path_removed() {
        let mut doc = doc();
        let mut list = CommentList::new();
        let anchor = CommentAnchor::new(vec![1, 0], 0, 3, "ann", "typo?");
        let id = anchor.id;
        list.add(anchor);
        assert_eq!(list.active(&doc).len(), 1);

        doc.remove(&[1]);
        assert!(list.active(&doc).is_empty());
        assert_eq!(list.orphaned(&doc)[0].id, id);
        assert_eq!(list.len(), 1);
        assert!(list.remove(id).is_some());
        assert!(list.is_empty());
    }

    #[test]
    fn mapped_anchor_keeps_its_text() {
        let doc = Document::new(vec![Node::paragraph("new"), Node::paragraph("first"), Node::paragraph("second")]);
        let mut list = CommentList::new();
        let mut anchor = CommentAnchor::new(vec![1, 0], 3, 0, "ann", "x");
        anchor.selection_text = "sec".into();
        list.add(anchor);

        list.map_anchors(|p| {
            let mut p = p.clone();
            p.path[0] += 1;
            Some(p)
        });
        let moved = &list.all()[0];
        assert_eq!(moved.path, vec![2, 0]);
        assert_eq!((moved.anchor_offset, moved.focus_offset), (3, 0));
        assert_eq!(list.active(&doc).len(), 1);

        list.map_anchors(|_| None);
        assert!(list.all()[0].orphaned);
        assert_eq!(list.orphaned(&doc).len(), 1);
    }

    #[test]
    fn typing_around_an_anchor() {
        let mut list = CommentList::new();
        list.add(CommentAnchor::new(vec![0, 0], 2, 4, "ann", "x"));
        list.shift_for_typing(&[0, 0], 4, 3);
        assert_eq!(list.all()[0].span(), (2, 4));
        list.shift_for_typing(&[0, 0], 2, 1);
        assert_eq!(list.all()[0].span(), (3, 5));
        list.shift_for_typing(&[0, 1], 0, 1);
        assert_eq!(list.all()[0].span(), (3, 5));
    }

    #[test]
    fn rebind_follows_leaf_splits() {
        let before = Document::new(vec![Node::paragraph("hello world")]);
        let mut list = CommentList::new();
        list.add(CommentAnchor::new(vec![0, 0], 6, 11, "ann", "x"));
        list.add(CommentAnchor::new(vec![0, 0], 0, 11, "bob", "y"));
        let spans = list.inline_spans(&before);

        let after = Document::new(vec![Node::element(
            mdforge_core::ElementKind::Paragraph,
            vec![Node::text("hello"), Node::text(" world")],
        )]);
        list.rebind(&after, spans);
        let first = &list.all()[0];
        assert_eq!((first.path.clone(), first.span()), (vec![0, 1], (1, 6)));
        assert!(list.all()[1].orphaned);
    }

    #[test]
    fn anchor_goes_orphan_when_text_shrinks() {
        let mut doc = doc();
        let mut list = CommentList::new();
        list.add(CommentAnchor::new(vec![0, 0], 2, 5, "ann", "x"));
        doc.text_mut(&[0, 0]).unwrap().text = "fi".into();
        assert_eq!(list.orphaned(&doc).len(), 1);
    }

    struct GatedHandler {
        gate: Notify,
        submits: AtomicUsize,
    }

    #[async_trait]
    impl CommentHandler for GatedHandler {
        async fn on_submit(&self, _comment: &CommentAnchor) -> anyhow::Result<()> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(())
        }

        async fn on_delete(&self, _id: Uuid) -> anyhow::Result<()> {
            anyhow::bail!("backend offline")
        }
    }

    fn store_with_selection() -> Arc<Mutex<EditorStore>> {
        let mut store = EditorStore::new(EditorOptions::default());
        store.set_markdown("comment on this");
        store.select(Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 7)));
        Arc::new(Mutex::new(store))
    }

    #[tokio::test]
    async fn submit_is_guarded_while_in_flight() {
        let handler = Arc::new(GatedHandler { gate: Notify::new(), submits: AtomicUsize::new(0) });
        let session = Arc::new(CommentSession::new(handler.clone()));
        let store = store_with_selection();

        let pending = {
            let (session, store) = (session.clone(), store.clone());
            tokio::spawn(async move { session.submit_comment(&store, "ann", "nice").await })
        };
        tokio::task::yield_now().await;

        let second = session.submit_comment(&store, "bob", "dup").await.unwrap();
        assert!(second.is_none());

        handler.gate.notify_one();
        let anchor = pending.await.unwrap().unwrap().unwrap();
        assert_eq!(anchor.selection_text, "comment");
        assert_eq!(handler.submits.load(Ordering::SeqCst), 1);
        assert_eq!(store.lock().await.comments().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_comment() {
        let handler = Arc::new(GatedHandler { gate: Notify::new(), submits: AtomicUsize::new(0) });
        let session = CommentSession::new(handler);
        let store = store_with_selection();
        let anchor = store.lock().await.comment_anchor("ann", "x").unwrap();
        let id = anchor.id;
        store.lock().await.add_comment(anchor);

        let err = session.delete_comment(&store, id).await.unwrap_err();
        assert!(err.to_string().contains("backend offline"));
        assert_eq!(store.lock().await.comments().len(), 1);
    }
}
