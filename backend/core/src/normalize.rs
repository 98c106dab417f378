//! Structural normalization of the schema tree.
//!
//! Runs after parsing and after every editor mutation. Enforces:
//! - the document and every container hold at least one child;
//! - block containers hold blocks and inline containers hold inline content;
//! - a list-item starts with a paragraph or a nested list;
//! - every table row spans exactly the table's column count;
//! - adjacent text leaves with identical marks are merged.

use tracing::debug;

use crate::document::Document;
use crate::node::{Element, ElementKind, Node, Text};

pub fn normalize(doc: &mut Document) {
    normalize_blocks(&mut doc.children);
    if doc.children.is_empty() {
        doc.children.push(Element::empty_paragraph().into());
    }
}

/// Normalize a list of block-level siblings in place.
pub fn normalize_blocks(children: &mut Vec<Node>) {
    for child in children.iter_mut() {
        if let Node::Element(el) = child {
            normalize_element(el);
        }
    }
    let taken = std::mem::take(children);
    *children = wrap_inline_runs(taken);
}

pub fn normalize_element(el: &mut Element) {
    if el.kind.is_void() {
        el.children.clear();
        return;
    }

    for child in el.children.iter_mut() {
        if let Node::Element(inner) = child {
            normalize_element(inner);
        }
    }

    match &el.kind {
        kind if kind.holds_inline() => {
            let taken = std::mem::take(&mut el.children);
            el.children = merge_leaves(flatten_to_inline(taken));
        }
        ElementKind::List { .. } => {
            let taken = std::mem::take(&mut el.children);
            el.children = taken
                .into_iter()
                .map(|node| match node {
                    Node::Element(item) if matches!(item.kind, ElementKind::ListItem { .. }) => {
                        Node::Element(item)
                    }
                    other => {
                        let mut item = Element::new(ElementKind::ListItem { checked: None }, vec![other]);
                        normalize_element(&mut item);
                        Node::Element(item)
                    }
                })
                .collect();
            if el.children.is_empty() {
                el.children.push(empty_list_item().into());
            }
        }
        ElementKind::ListItem { .. } => {
            let taken = std::mem::take(&mut el.children);
            el.children = wrap_inline_runs(taken);
            let starts_ok = el.children.first().and_then(Node::kind).is_some_and(|k| {
                matches!(k, ElementKind::Paragraph | ElementKind::List { .. })
            });
            if !starts_ok {
                el.children.insert(0, Element::empty_paragraph().into());
            }
        }
        ElementKind::Table { align } => {
            let columns = column_count(align, &el.children);
            let mut align = align.clone();
            align.resize(columns, None);
            el.kind = ElementKind::Table { align };

            let taken = std::mem::take(&mut el.children);
            el.children = taken
                .into_iter()
                .filter_map(|node| match node {
                    Node::Element(row) if row.kind == ElementKind::TableRow => Some(row),
                    _ => None,
                })
                .enumerate()
                .map(|(i, mut row)| {
                    fit_row(&mut row, columns, i == 0);
                    Node::Element(row)
                })
                .collect();
            if el.children.is_empty() {
                let mut row = Element::new(ElementKind::TableRow, Vec::new());
                fit_row(&mut row, columns, true);
                el.children.push(row.into());
            }
        }
        ElementKind::TableRow => {
            el.children.retain(|node| matches!(node.kind(), Some(ElementKind::TableCell { .. })));
        }
        _ => {
            let taken = std::mem::take(&mut el.children);
            el.children = wrap_inline_runs(taken);
            if el.children.is_empty() {
                el.children.push(Element::empty_paragraph().into());
            }
        }
    }
}

fn empty_list_item() -> Element {
    Element::new(ElementKind::ListItem { checked: None }, vec![Element::empty_paragraph().into()])
}

fn empty_cell(header: bool) -> Node {
    Element::new(ElementKind::table_cell(header), vec![Node::Text(Text::default())]).into()
}

fn span_of(node: &Node) -> usize {
    match node.kind() {
        Some(ElementKind::TableCell { colspan, .. }) => (*colspan).max(1) as usize,
        _ => 1,
    }
}

fn column_count(align: &[Option<crate::node::CellAlign>], rows: &[Node]) -> usize {
    if !align.is_empty() {
        return align.len();
    }
    rows.first()
        .map(|row| row.children().iter().map(span_of).sum::<usize>())
        .unwrap_or(0)
        .max(1)
}

fn fit_row(row: &mut Element, columns: usize, header: bool) {
    row.children.retain(|node| matches!(node.kind(), Some(ElementKind::TableCell { .. })));
    let mut width: usize = row.children.iter().map(span_of).sum();
    if width != columns {
        debug!(width, columns, "Fitting table row to column count");
    }
    while width > columns {
        match row.children.pop() {
            Some(cell) => width -= span_of(&cell),
            None => break,
        }
    }
    while width < columns {
        row.children.push(empty_cell(header));
        width += 1;
    }
}

/// Group runs of inline nodes into paragraphs, leaving blocks untouched.
fn wrap_inline_runs(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut run: Vec<Node> = Vec::new();
    for node in children {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        flush_run(&mut run, &mut out);
        out.push(node);
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    if run.is_empty() {
        return;
    }
    let mut para = Element::paragraph(std::mem::take(run));
    normalize_element(&mut para);
    out.push(para.into());
}

/// Replace block children of an inline container with their text.
fn flatten_to_inline(children: Vec<Node>) -> Vec<Node> {
    children
        .into_iter()
        .map(|node| {
            if node.is_inline() {
                node
            } else {
                Node::text(node.plain_text())
            }
        })
        .collect()
}

/// Merge adjacent leaves with identical marks and drop redundant empty leaves.
pub fn merge_leaves(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for node in children {
        if let Node::Text(t) = &node {
            if t.is_empty() && t.marks.footnote.is_none() {
                continue;
            }
            if let Some(Node::Text(prev)) = out.last_mut() {
                if prev.marks == t.marks && t.marks.footnote.is_none() {
                    prev.text.push_str(&t.text);
                    continue;
                }
            }
        }
        out.push(node);
    }
    if out.is_empty() {
        out.push(Node::Text(Text::default()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Marks;

    fn table(rows: Vec<Vec<&str>>, columns: usize) -> Element {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                Node::element(
                    ElementKind::TableRow,
                    cells
                        .into_iter()
                        .map(|c| Node::element(ElementKind::table_cell(i == 0), vec![Node::text(c)]))
                        .collect(),
                )
            })
            .collect();
        Element::new(ElementKind::Table { align: vec![None; columns] }, rows)
    }

    #[test]
    fn pads_and_truncates_table_rows() {
        let mut t = table(vec![vec!["a", "b"], vec!["1"], vec!["x", "y", "z"]], 2);
        normalize_element(&mut t);
        for row in &t.children {
            assert_eq!(row.children().len(), 2);
        }
        assert_eq!(t.children[2].plain_text(), "xy");
    }

    #[test]
    fn list_item_gets_leading_paragraph() {
        let mut item = Element::new(
            ElementKind::ListItem { checked: None },
            vec![Element::void(ElementKind::Hr).into()],
        );
        normalize_element(&mut item);
        assert_eq!(item.children[0].kind(), Some(&ElementKind::Paragraph));
        assert_eq!(item.children.len(), 2);
    }

    #[test]
    fn list_item_wraps_inline_content() {
        let mut item = Element::new(ElementKind::ListItem { checked: None }, vec![Node::text("loose")]);
        normalize_element(&mut item);
        assert_eq!(item.children.len(), 1);
        assert_eq!(item.children[0].kind(), Some(&ElementKind::Paragraph));
    }

    #[test]
    fn merges_adjacent_leaves() {
        let bold = Marks { bold: true, ..Default::default() };
        let merged = merge_leaves(vec![
            Node::text("a"),
            Node::text("b"),
            Node::Text(Text::with_marks("c", bold.clone())),
            Node::Text(Text::with_marks("d", bold)),
            Node::text(""),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].plain_text(), "ab");
        assert_eq!(merged[1].plain_text(), "cd");
    }

    #[test]
    fn empty_document_gets_paragraph() {
        let mut doc = Document::default();
        normalize(&mut doc);
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].kind(), Some(&ElementKind::Paragraph));
    }

    #[test]
    fn root_inline_nodes_are_wrapped() {
        let mut doc = Document::new(vec![Node::text("stray"), Node::paragraph("p")]);
        normalize(&mut doc);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].plain_text(), "stray");
    }
}
