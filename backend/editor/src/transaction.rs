//! Raw tree edits.
//!
//! A [`Transaction`] mutates the document in place without normalizing; the
//! store normalizes once when the transaction commits and records a single
//! history step for everything done inside it. Every edit checks its paths
//! first and returns `false` (or zero) when they no longer resolve. The
//! selection and any attached comment anchors follow each edit.

use mdforge_core::{Document, Element, Marks, Node, Path, Point, Range, Text};
use tracing::debug;

use crate::comments::CommentList;

pub struct Transaction<'a> {
    doc: &'a mut Document,
    selection: &'a mut Option<Range>,
    comments: Option<&'a mut CommentList>,
    changed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(doc: &'a mut Document, selection: &'a mut Option<Range>) -> Self {
        Self { doc, selection, comments: None, changed: false }
    }

    pub(crate) fn with_comments(mut self, comments: &'a mut CommentList) -> Self {
        self.comments = Some(comments);
        self
    }

    pub(crate) fn changed(&self) -> bool {
        self.changed
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, range: Range) -> bool {
        if !range_resolves(self.doc, &range) {
            debug!(?range, "Ignoring selection outside the document");
            return false;
        }
        *self.selection = Some(range);
        true
    }

    /// Insert `nodes` so the first one lands at `path`.
    pub fn insert_nodes(&mut self, path: &[usize], nodes: Vec<Node>) -> bool {
        if nodes.is_empty() {
            return false;
        }
        let count = nodes.len();
        if !self.doc.insert(path, nodes) {
            debug!(?path, "Stale insert path, ignoring");
            return false;
        }
        self.map_points(|point| Some(shift_for_insert(point, path, count)));
        self.changed = true;
        true
    }

    pub fn remove_node(&mut self, path: &[usize]) -> bool {
        if self.doc.remove(path).is_none() {
            debug!(?path, "Stale remove path, ignoring");
            return false;
        }
        self.map_points(|point| shift_for_remove(point, path));
        self.changed = true;
        true
    }

    /// Rewrite both selection ends and every comment anchor. The selection
    /// is dropped, and an anchor orphaned, when an end has no counterpart
    /// any more.
    fn map_points(&mut self, map: impl Fn(&Point) -> Option<Point>) {
        if let Some(range) = self.selection.as_ref() {
            *self.selection = match (map(&range.anchor), map(&range.focus)) {
                (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
                _ => None,
            };
        }
        if let Some(comments) = self.comments.as_deref_mut() {
            comments.map_anchors(map);
        }
    }

    /// Apply `update` to the element at `path`.
    pub fn update_element(&mut self, path: &[usize], update: impl FnOnce(&mut Element)) -> bool {
        match self.doc.node_mut(path) {
            Some(Node::Element(el)) => {
                update(el);
                self.changed = true;
                true
            }
            _ => {
                debug!(?path, "No element at path, ignoring");
                false
            }
        }
    }

    /// Insert `text` at the selection, replacing the selected text first.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some(range) = self.selection.clone() else {
            debug!("insert_text without a selection, ignoring");
            return false;
        };
        if text.is_empty() || !range_resolves(self.doc, &range) {
            debug!(?range, "Stale selection for insert_text, ignoring");
            return false;
        }

        let point = self.delete_range(&range);
        let Some(leaf) = self.doc.text_mut(&point.path) else {
            return false;
        };
        let offset = point.offset.min(leaf.len());
        let at = byte_index(&leaf.text, offset);
        leaf.text.insert_str(at, text);
        self.changed = true;
        let count = text.chars().count();
        if let Some(comments) = self.comments.as_deref_mut() {
            comments.shift_for_typing(&point.path, offset, count);
        }
        *self.selection = Some(Range::collapsed(Point::new(point.path, offset + count)));
        true
    }

    /// Delete the selected text; the selection collapses to its start.
    pub fn delete_selection(&mut self) -> bool {
        let Some(range) = self.selection.clone() else {
            return false;
        };
        if range.is_collapsed() || !range_resolves(self.doc, &range) {
            return false;
        }
        let earlier = std::mem::take(&mut self.changed);
        self.delete_range(&range);
        let deleted = self.changed;
        self.changed |= earlier;
        deleted
    }

    fn delete_range(&mut self, range: &Range) -> Point {
        let (start, end) = range.ordered();
        let (start, end) = (start.clone(), end.clone());
        if start == end {
            return start;
        }

        for path in leaf_paths_between(self.doc, &start.path, &end.path) {
            let Some(leaf) = self.doc.text_mut(&path) else {
                continue;
            };
            let len = leaf.len();
            let from = if path == start.path { start.offset.min(len) } else { 0 };
            let to = if path == end.path { end.offset.min(len) } else { len };
            if from < to {
                let range = byte_index(&leaf.text, from)..byte_index(&leaf.text, to);
                leaf.text.replace_range(range, "");
                self.changed = true;
                if let Some(comments) = self.comments.as_deref_mut() {
                    comments.map_anchors(|p| Some(shift_for_delete(p, &path, from, to)));
                }
            }
        }
        *self.selection = Some(Range::collapsed(start.clone()));
        start
    }

    /// Replace `search` inside text leaves. Matches do not span leaves.
    pub fn replace_text(&mut self, search: &str, replacement: &str, all: bool) -> usize {
        if search.is_empty() {
            return 0;
        }
        let paths: Vec<Path> = self.doc.leaves().into_iter().map(|(path, _)| path).collect();
        let mut count = 0;
        for path in paths {
            let Some(leaf) = self.doc.text_mut(&path) else {
                continue;
            };
            let found = leaf.text.matches(search).count();
            if found == 0 {
                continue;
            }
            if all {
                leaf.text = leaf.text.replace(search, replacement);
                count += found;
            } else {
                leaf.text = leaf.text.replacen(search, replacement, 1);
                count = 1;
                break;
            }
        }
        if count > 0 {
            self.changed = true;
        }
        count
    }

    /// Split the leaves covered by `range` at its edges and apply `mark` to
    /// the covered parts. The selection collapses at the end of the range.
    pub fn set_marks(&mut self, range: &Range, mark: impl Fn(&mut Marks)) -> bool {
        if range.is_collapsed() || !range_resolves(self.doc, range) {
            debug!(?range, "Empty or stale range for marks, ignoring");
            return false;
        }
        let (start, end) = range.ordered();
        let (start, end) = (start.clone(), end.clone());
        let end_position = inline_position(self.doc, &end);
        let spans = self.comments.as_deref().map(|comments| comments.inline_spans(self.doc));

        let mut applied = false;
        for path in leaf_paths_between(self.doc, &start.path, &end.path).into_iter().rev() {
            let Some(leaf) = self.doc.text(&path).cloned() else {
                continue;
            };
            let len = leaf.len();
            let from = if path == start.path { start.offset.min(len) } else { 0 };
            let to = if path == end.path { end.offset.min(len) } else { len };
            if from >= to {
                continue;
            }
            let mut marks = leaf.marks.clone();
            mark(&mut marks);
            let pieces = split_leaf(&leaf, from, to, marks);

            let Some((index, parent)) = path.split_last() else {
                continue;
            };
            let Some(siblings) = self.doc.children_mut(parent) else {
                continue;
            };
            siblings.splice(*index..=*index, pieces);
            applied = true;
        }

        if applied {
            self.changed = true;
            if let (Some(comments), Some(spans)) = (self.comments.as_deref_mut(), spans) {
                comments.rebind(self.doc, spans);
            }
            if let Some(point) = end_position.and_then(|(parent, offset)| point_at_inline(self.doc, &parent, offset)) {
                *self.selection = Some(Range::collapsed(point));
            }
        }
        applied
    }

    pub fn insert_link(&mut self, range: &Range, url: &str) -> bool {
        self.set_marks(range, |marks| marks.url = Some(url.to_string()))
    }

    /// Move the top-level block at `from` so it lands before the block that
    /// is currently at `to` (`to == len` moves it to the end).
    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        let len = self.doc.children.len();
        if from >= len || to > len {
            debug!(from, to, len, "Stale block move, ignoring");
            return false;
        }
        let target = if to > from { to - 1 } else { to };
        if target == from {
            return false;
        }
        let block = self.doc.children.remove(from);
        self.doc.children.insert(target, block);
        self.map_points(|point| Some(shift_for_move(point, from, target)));
        self.changed = true;
        true
    }

    pub fn set_content(&mut self, nodes: Vec<Node>) {
        self.doc.children = nodes;
        *self.selection = None;
        self.orphan_comments();
        self.changed = true;
    }

    pub fn clear(&mut self) {
        self.doc.children = vec![Element::empty_paragraph().into()];
        *self.selection = self.doc.start_point().map(Range::collapsed);
        self.orphan_comments();
        self.changed = true;
    }

    fn orphan_comments(&mut self) {
        if let Some(comments) = self.comments.as_deref_mut() {
            comments.orphan_all();
        }
    }
}

/// Where `point` ends up after `count` nodes were inserted at `at`.
fn shift_for_insert(point: &Point, at: &[usize], count: usize) -> Point {
    let mut point = point.clone();
    if let Some((index, parent)) = at.split_last() {
        let depth = parent.len();
        if point.path.len() > depth && point.path.starts_with(parent) && point.path[depth] >= *index {
            point.path[depth] += count;
        }
    }
    point
}

/// Where `point` ends up after the node at `at` was removed; `None` when it
/// was inside that node.
fn shift_for_remove(point: &Point, at: &[usize]) -> Option<Point> {
    if point.path.starts_with(at) {
        return None;
    }
    let mut point = point.clone();
    if let Some((index, parent)) = at.split_last() {
        let depth = parent.len();
        if point.path.len() > depth && point.path.starts_with(parent) && point.path[depth] > *index {
            point.path[depth] -= 1;
        }
    }
    Some(point)
}

/// Where `point` ends up after the top-level block at `from` moved to `target`.
fn shift_for_move(point: &Point, from: usize, target: usize) -> Point {
    let mut point = point.clone();
    if let Some(first) = point.path.first_mut() {
        *first = match *first {
            i if i == from => target,
            i if from < i && i <= target => i - 1,
            i if target <= i && i < from => i + 1,
            i => i,
        };
    }
    point
}

/// Where `point` ends up after characters `from..to` of the leaf at `path`
/// were deleted. Points inside the deleted run collapse onto its start.
fn shift_for_delete(point: &Point, path: &[usize], from: usize, to: usize) -> Point {
    let mut point = point.clone();
    if point.path == path && point.offset > from {
        point.offset = if point.offset >= to { point.offset - (to - from) } else { from };
    }
    point
}

fn split_leaf(leaf: &Text, from: usize, to: usize, marks: Marks) -> Vec<Node> {
    let before: String = leaf.text.chars().take(from).collect();
    let middle: String = leaf.text.chars().skip(from).take(to - from).collect();
    let after: String = leaf.text.chars().skip(to).collect();

    let mut pieces = Vec::with_capacity(3);
    if !before.is_empty() {
        pieces.push(Text::with_marks(before, leaf.marks.clone()).into());
    }
    pieces.push(Text::with_marks(middle, marks).into());
    if !after.is_empty() {
        pieces.push(Text::with_marks(after, leaf.marks.clone()).into());
    }
    pieces
}

fn leaf_paths_between(doc: &Document, start: &Path, end: &Path) -> Vec<Path> {
    doc.leaves()
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path >= start && path <= end)
        .collect()
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

pub(crate) fn point_resolves(doc: &Document, point: &Point) -> bool {
    doc.text(&point.path).is_some_and(|t| point.offset <= t.len())
}

pub(crate) fn range_resolves(doc: &Document, range: &Range) -> bool {
    point_resolves(doc, &range.anchor) && point_resolves(doc, &range.focus)
}

fn siblings<'d>(doc: &'d Document, parent: &[usize]) -> Option<&'d [Node]> {
    if parent.is_empty() {
        Some(&doc.children)
    } else {
        Some(doc.node(parent)?.children())
    }
}

/// A point as (parent path, character offset across the parent's text
/// children). Splitting or merging leaves keeps this stable.
pub(crate) fn inline_position(doc: &Document, point: &Point) -> Option<(Path, usize)> {
    let (index, parent) = point.path.split_last()?;
    let before: usize = siblings(doc, parent)?
        .iter()
        .take(*index)
        .filter_map(Node::as_text)
        .map(Text::len)
        .sum();
    Some((parent.to_vec(), before + point.offset))
}

/// Inverse of [`inline_position`]; offsets past the end clamp to the last leaf.
pub(crate) fn point_at_inline(doc: &Document, parent: &[usize], offset: usize) -> Option<Point> {
    let mut remaining = offset;
    let mut last = None;
    for (i, node) in siblings(doc, parent)?.iter().enumerate() {
        if let Node::Text(text) = node {
            let mut path = parent.to_vec();
            path.push(i);
            if remaining <= text.len() {
                return Some(Point::new(path, remaining));
            }
            remaining -= text.len();
            last = Some(Point::new(path, text.len()));
        }
    }
    last
}

/// The one text leaf under `parent` holding `len` characters from inline
/// `offset`, as a point at the start of that run. `None` when the run
/// straddles leaves or runs past the end.
pub(crate) fn span_at_inline(doc: &Document, parent: &[usize], offset: usize, len: usize) -> Option<Point> {
    let mut remaining = offset;
    for (i, node) in siblings(doc, parent)?.iter().enumerate() {
        let Node::Text(text) = node else {
            continue;
        };
        if remaining < text.len() || (len == 0 && remaining <= text.len()) {
            if remaining + len > text.len() {
                return None;
            }
            let mut path = parent.to_vec();
            path.push(i);
            return Some(Point::new(path, remaining));
        }
        remaining -= text.len();
    }
    None
}
