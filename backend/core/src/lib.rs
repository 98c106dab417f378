//! Core types for the mdforge editor: the editable schema tree, path-based
//! addressing, normalization, and comment anchors.

pub mod comment;
pub mod document;
pub mod error;
pub mod node;
pub mod normalize;

pub use comment::CommentAnchor;
pub use document::{Document, Path, Point, Range};
pub use error::EditorError;
pub use node::{CellAlign, Element, ElementKind, Marks, Node, Text};
pub use normalize::{merge_leaves, normalize, normalize_blocks, normalize_element};
