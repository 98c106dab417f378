//! Path-addressed document tree.
//!
//! Nodes are addressed by their index path from the root, so "is this
//! reference still valid" is a plain existence lookup.

use serde::{Deserialize, Serialize};

use crate::node::{Node, Text};

/// Index path from the document root.
pub type Path = Vec<usize>;

/// A position inside a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// A selection between two points; collapsed when both are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self { anchor: point.clone(), focus: point }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The two ends in document order.
    pub fn ordered(&self) -> (&Point, &Point) {
        let anchor = (&self.anchor.path, self.anchor.offset);
        let focus = (&self.focus.path, self.focus.offset);
        if anchor <= focus {
            (&self.anchor, &self.focus)
        } else {
            (&self.focus, &self.anchor)
        }
    }
}

/// The root of a schema tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for idx in rest {
            node = node.as_element()?.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for idx in rest {
            node = node.as_element_mut()?.children.get_mut(*idx)?;
        }
        Some(node)
    }

    pub fn has_path(&self, path: &[usize]) -> bool {
        self.node(path).is_some()
    }

    pub fn text(&self, path: &[usize]) -> Option<&Text> {
        self.node(path)?.as_text()
    }

    pub fn text_mut(&mut self, path: &[usize]) -> Option<&mut Text> {
        match self.node_mut(path)? {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    /// Children list of the node at `parent` (the root list for `[]`).
    pub fn children_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Node>> {
        if parent.is_empty() {
            return Some(&mut self.children);
        }
        match self.node_mut(parent)? {
            Node::Element(el) if !el.kind.is_void() => Some(&mut el.children),
            _ => None,
        }
    }

    /// Insert `nodes` so the first lands at `path`. Returns false when the
    /// parent does not exist or the index is past the end.
    pub fn insert(&mut self, path: &[usize], nodes: Vec<Node>) -> bool {
        let Some((index, parent)) = path.split_last() else {
            return false;
        };
        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        if *index > children.len() {
            return false;
        }
        children.splice(*index..*index, nodes);
        true
    }

    pub fn remove(&mut self, path: &[usize]) -> Option<Node> {
        let (index, parent) = path.split_last()?;
        let children = self.children_mut(parent)?;
        if *index >= children.len() {
            return None;
        }
        Some(children.remove(*index))
    }

    /// Every text leaf with its path, in document order.
    pub fn leaves(&self) -> Vec<(Path, &Text)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for (i, node) in self.children.iter().enumerate() {
            path.push(i);
            walk_leaves(node, &mut path, &mut out);
            path.pop();
        }
        out
    }

    /// Point at the end of the last text leaf.
    pub fn end_point(&self) -> Option<Point> {
        self.leaves().pop().map(|(path, text)| Point::new(path, text.len()))
    }

    pub fn start_point(&self) -> Option<Point> {
        self.leaves().into_iter().next().map(|(path, _)| Point::new(path, 0))
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

fn walk_leaves<'a>(node: &'a Node, path: &mut Path, out: &mut Vec<(Path, &'a Text)>) {
    match node {
        Node::Text(t) => out.push((path.clone(), t)),
        Node::Element(el) => {
            for (i, child) in el.children.iter().enumerate() {
                path.push(i);
                walk_leaves(child, path, out);
                path.pop();
            }
        }
    }
}

impl From<Vec<Node>> for Document {
    fn from(children: Vec<Node>) -> Self {
        Self::new(children)
    }
}
