//! Renderers for the Markdown IR
//!
//! Prints the mdast tree as CommonMark/GFM text, or flattens it to plain text.

use mdforge_core::CellAlign;

use crate::code_block::CodeBlockAnalyzer;
use crate::ir::MdNode;

pub struct Renderer;

impl Renderer {
    /// Renders AST to Markdown. Blocks are separated by one blank line and
    /// the output carries no trailing newline.
    pub fn to_markdown(root: &MdNode) -> String {
        match root {
            MdNode::Root { children } => render_blocks(children, "\n\n"),
            other => render_block(other),
        }
    }

    /// Renders AST to plain text, stripping all formatting.
    pub fn to_plain_text(nodes: &[MdNode]) -> String {
        let mut output = String::new();
        for node in nodes {
            match node {
                MdNode::Text { value } | MdNode::InlineCode { value } => output.push_str(value),
                MdNode::Code { value, .. } => {
                    output.push_str(value);
                    output.push('\n');
                }
                MdNode::Break => output.push('\n'),
                MdNode::Image { alt, .. } => output.push_str(alt),
                MdNode::FootnoteReference { identifier } => {
                    output.push_str(&format!("[{identifier}]"))
                }
                MdNode::Html { .. } | MdNode::ThematicBreak => {}
                MdNode::Paragraph { children }
                | MdNode::Heading { children, .. }
                | MdNode::TableRow { children } => {
                    output.push_str(&Self::to_plain_text(children));
                    output.push('\n');
                }
                MdNode::TableCell { children } => {
                    output.push_str(&Self::to_plain_text(children));
                    output.push('\t');
                }
                other => output.push_str(&Self::to_plain_text(other.children())),
            }
        }
        output
    }
}

fn render_blocks(nodes: &[MdNode], separator: &str) -> String {
    nodes.iter().map(render_block).collect::<Vec<_>>().join(separator)
}

fn render_block(node: &MdNode) -> String {
    match node {
        MdNode::Root { children } => render_blocks(children, "\n\n"),
        MdNode::Paragraph { children } => render_inline(children, Context::Flow),
        MdNode::Heading { depth, children } => {
            let text = render_inline(children, Context::Heading);
            let marker = "#".repeat(usize::from(*depth));
            if text.is_empty() {
                marker
            } else {
                format!("{marker} {text}")
            }
        }
        MdNode::ThematicBreak => "***".to_string(),
        MdNode::Blockquote { children } => {
            let inner = render_blocks(children, "\n\n");
            prefix_lines(&inner, "> ", ">")
        }
        MdNode::List { ordered, start, spread, children } => {
            render_list(*ordered, start.unwrap_or(1), *spread, children)
        }
        MdNode::ListItem { .. } => render_list(false, 1, false, std::slice::from_ref(node)),
        MdNode::Code { lang, value } => {
            let fence = CodeBlockAnalyzer::fence_for(value);
            format!("{fence}{}\n{value}\n{fence}", lang.as_deref().unwrap_or(""))
        }
        MdNode::Html { value } => value.trim_end().to_string(),
        MdNode::Table { align, children } => render_table(align, children),
        MdNode::FootnoteDefinition { identifier, children } => {
            let inner = render_blocks(children, "\n\n");
            let indented = indent_continuation(&inner, "    ");
            format!("[^{identifier}]: {indented}")
        }
        inline => render_inline(std::slice::from_ref(inline), Context::Flow),
    }
}

fn render_list(ordered: bool, start: u64, spread: bool, items: &[MdNode]) -> String {
    // A tight item holding several paragraphs cannot be expressed tightly.
    let spread = spread
        || items.iter().any(|item| {
            item.children()
                .iter()
                .filter(|c| !matches!(c, MdNode::List { .. }))
                .count()
                > 1
        });
    let inner_sep = if spread { "\n\n" } else { "\n" };

    let rendered: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = if ordered {
                format!("{}. ", start + i as u64)
            } else {
                "- ".to_string()
            };
            let task = match item {
                MdNode::ListItem { checked: Some(true), .. } => "[x] ",
                MdNode::ListItem { checked: Some(false), .. } => "[ ] ",
                _ => "",
            };
            let body = render_blocks(item.children(), inner_sep);
            let pad = " ".repeat(marker.len());
            let line = format!("{marker}{task}{}", indent_continuation(&body, &pad));
            line.trim_end().to_string()
        })
        .collect();
    rendered.join(inner_sep)
}

fn render_table(align: &[Option<CellAlign>], rows: &[MdNode]) -> String {
    let columns = rows
        .iter()
        .map(|row| row.children().len())
        .max()
        .unwrap_or(0)
        .max(align.len());
    if columns == 0 {
        return String::new();
    }

    let render_row = |row: &MdNode| {
        let mut cells: Vec<String> = row
            .children()
            .iter()
            .map(|cell| render_inline(cell.children(), Context::TableCell))
            .collect();
        cells.resize(columns, String::new());
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut iter = rows.iter();
    let header = iter.next().map(render_row).unwrap_or_else(|| render_row(&MdNode::TableRow { children: Vec::new() }));
    lines.push(header);
    let delimiter: Vec<&str> = (0..columns)
        .map(|i| match align.get(i).copied().flatten() {
            None => "---",
            Some(CellAlign::Left) => ":---",
            Some(CellAlign::Center) => ":---:",
            Some(CellAlign::Right) => "---:",
        })
        .collect();
    lines.push(format!("| {} |", delimiter.join(" | ")));
    lines.extend(iter.map(render_row));
    lines.join("\n")
}

fn prefix_lines(text: &str, prefix: &str, empty_prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                empty_prefix.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent every line but the first; blank lines stay blank.
fn indent_continuation(text: &str, pad: &str) -> String {
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or("").to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(pad);
            out.push_str(line);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Inline content
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    Flow,
    Heading,
    TableCell,
}

fn render_inline(nodes: &[MdNode], ctx: Context) -> String {
    let mut out = String::new();
    for node in nodes {
        write_inline(node, ctx, &mut out);
    }
    out
}

fn write_inline(node: &MdNode, ctx: Context, out: &mut String) {
    match node {
        MdNode::Text { value } => write_text(value, ctx, out),
        MdNode::Emphasis { children } => wrap(children, "*", ctx, out),
        MdNode::Strong { children } => wrap(children, "**", ctx, out),
        MdNode::Delete { children } => wrap(children, "~~", ctx, out),
        MdNode::InlineCode { value } => {
            let fence = CodeBlockAnalyzer::span_fence_for(value);
            let needs_pad = value.starts_with('`')
                || value.ends_with('`')
                || (value.starts_with(' ') && value.ends_with(' ') && !value.trim().is_empty());
            let pad = if needs_pad { " " } else { "" };
            out.push_str(&format!("{fence}{pad}{value}{pad}{fence}"));
        }
        MdNode::Break => match ctx {
            Context::Flow => out.push_str("\\\n"),
            Context::Heading => out.push(' '),
            Context::TableCell => out.push_str("<br>"),
        },
        MdNode::Link { url, title, children } => {
            out.push('[');
            for child in children {
                write_inline(child, ctx, out);
            }
            out.push_str("](");
            out.push_str(&destination(url));
            write_title(title.as_deref(), out);
            out.push(')');
        }
        MdNode::Image { url, title, alt } => {
            out.push_str("![");
            write_text(alt, Context::Heading, out);
            out.push_str("](");
            out.push_str(&destination(url));
            write_title(title.as_deref(), out);
            out.push(')');
        }
        MdNode::FootnoteReference { identifier } => out.push_str(&format!("[^{identifier}]")),
        MdNode::Html { value } => out.push_str(value),
        other => write_text(&Renderer::to_plain_text(std::slice::from_ref(other)), ctx, out),
    }
}

fn wrap(children: &[MdNode], delimiter: &str, ctx: Context, out: &mut String) {
    out.push_str(delimiter);
    for child in children {
        write_inline(child, ctx, out);
    }
    out.push_str(delimiter);
}

fn destination(url: &str) -> String {
    if url.is_empty() || url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '<') {
        format!("<{}>", url.replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

fn write_title(title: Option<&str>, out: &mut String) {
    if let Some(title) = title {
        out.push_str(" \"");
        out.push_str(&title.replace('"', "\\\""));
        out.push('"');
    }
}

/// Escape text so re-parsing yields the same characters.
fn write_text(value: &str, ctx: Context, out: &mut String) {
    for (i, segment) in value.split('\n').enumerate() {
        if i > 0 {
            match ctx {
                Context::Flow => out.push('\n'),
                Context::Heading => out.push(' '),
                Context::TableCell => out.push_str("<br>"),
            }
        }
        let line_start = ctx == Context::Flow && (out.is_empty() || out.ends_with('\n'));
        escape_segment(segment, line_start, ctx, out);
    }
}

fn escape_segment(segment: &str, line_start: bool, ctx: Context, out: &mut String) {
    let chars: Vec<char> = segment.chars().collect();
    let leading_digits = chars.iter().take_while(|c| c.is_ascii_digit()).count();

    for (i, &c) in chars.iter().enumerate() {
        let escape = match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '~' => true,
            '|' => ctx == Context::TableCell,
            '&' => looks_like_entity(&chars[i + 1..]),
            '#' | '>' | '-' | '+' | '=' => line_start && i == 0,
            '.' | ')' => line_start && i > 0 && i == leading_digits,
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
}

fn looks_like_entity(rest: &[char]) -> bool {
    let name_len = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '#')
        .count();
    name_len > 0 && rest.get(name_len) == Some(&';')
}
