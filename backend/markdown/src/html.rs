//! Raw HTML handling.
//!
//! A fixed allow-list of tags renders natively (tables, `<font>`, `<sup>`,
//! `<sub>`, `<br>`); `<think>` becomes a thinking block; every other tag is
//! a transparent wrapper whose markup is stripped and whose text is kept.

use std::borrow::Cow;
use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::code_block::{CodeBlockAnalyzer, THINK_LANGUAGE};
use crate::ir::MdNode;

/// Tags rendered as native elements instead of being stripped.
pub const ALLOWED_TAGS: &[&str] = &[
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "colgroup", "col", "font",
    "sup", "sub", "br",
];

/// Block-level members of the allow-list; these keep an HTML block alive.
const BLOCK_TAGS: &[&str] = &["table", "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "colgroup", "col"];

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^<>]*?)?)\s*(/?)>"#).expect("tag regex")
});

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*<!--(.*?)-->").expect("comment regex")
});

static COLOR_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"color\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("color regex")
});

pub fn is_allowed_tag(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ALLOWED_TAGS.contains(&lower.as_str())
}

/// Rewrite every `<think>…</think>` region (an unterminated one runs to the
/// end of the text) into a fenced code block tagged `think`, so the Markdown
/// parser keeps its content together as one block.
///
/// Only tags the parser reads as raw HTML count. A `<think>` inside a code
/// span, a fenced block or escaped text is left alone.
pub fn preprocess_think(markdown: &str, options: Options) -> Cow<'_, str> {
    if !markdown.contains(THINK_OPEN) {
        return Cow::Borrowed(markdown);
    }
    let html_ranges: Vec<Range<usize>> = Parser::new_ext(markdown, options)
        .into_offset_iter()
        .filter_map(|(event, range)| matches!(event, Event::Html(_)).then_some(range))
        .collect();
    let is_html = |at: usize, len: usize| html_ranges.iter().any(|r| r.start <= at && at + len <= r.end);

    let mut out = String::with_capacity(markdown.len() + 16);
    let mut cursor = 0;
    while let Some(open) = find_tag(markdown, THINK_OPEN, cursor, &is_html) {
        let body_start = open + THINK_OPEN.len();
        let (body_end, next) = match find_tag(markdown, THINK_CLOSE, body_start, &is_html) {
            Some(close) => (close, close + THINK_CLOSE.len()),
            None => (markdown.len(), markdown.len()),
        };
        let body = markdown[body_start..body_end].trim_matches('\n');
        let fence = CodeBlockAnalyzer::fence_for(body);
        out.push_str(&markdown[cursor..open]);
        out.push_str(&format!("\n\n{fence}{THINK_LANGUAGE}\n{body}\n{fence}\n\n"));
        cursor = next;
    }
    if cursor == 0 {
        return Cow::Borrowed(markdown);
    }
    out.push_str(&markdown[cursor..]);
    Cow::Owned(out)
}

fn find_tag(src: &str, tag: &str, from: usize, is_html: impl Fn(usize, usize) -> bool) -> Option<usize> {
    src[from..]
        .match_indices(tag)
        .map(|(i, _)| from + i)
        .find(|&at| is_html(at, tag.len()))
}

/// Split leading `<!-- … -->` comments from an HTML block. JSON object
/// comments are merged into the returned configuration; anything else is
/// dropped. Returns the configuration and the remaining HTML.
pub fn split_config_comments(html: &str) -> (Option<Map<String, Value>>, &str) {
    let mut rest = html;
    let mut config: Option<Map<String, Value>> = None;
    while let Some(caps) = COMMENT_RE.captures(rest) {
        let body = caps.get(1).map_or("", |m| m.as_str()).trim();
        if let Some(map) = parse_config(body) {
            config.get_or_insert_with(Map::new).extend(map);
        }
        let end = caps.get(0).map_or(0, |m| m.end());
        rest = &rest[end..];
    }
    (config, rest)
}

fn parse_config(body: &str) -> Option<Map<String, Value>> {
    if !body.starts_with('{') {
        debug!("Ignoring non-JSON HTML comment");
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Malformed JSON block configuration ignored");
            None
        }
    }
}

/// How an HTML block should land in the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlBlock {
    /// Allow-listed block markup, kept as raw HTML.
    Native(String),
    /// Phrasing content: text plus any allow-listed inline tags, with
    /// unknown markup already stripped.
    Inline(String),
    Empty,
}

pub fn classify_block(html: &str) -> HtmlBlock {
    let cleaned = strip_unknown_tags(html);
    let has_native_block = TAG_RE
        .captures_iter(&cleaned)
        .any(|caps| BLOCK_TAGS.contains(&caps[2].to_ascii_lowercase().as_str()));
    if has_native_block {
        return HtmlBlock::Native(cleaned.trim_end().to_string());
    }
    let text = cleaned.trim();
    if text.is_empty() {
        HtmlBlock::Empty
    } else {
        HtmlBlock::Inline(text.to_string())
    }
}

/// Split the content of an [`HtmlBlock::Inline`] into text runs and the tags
/// between them, ready for the inline walk. Line breaks hugging the inside of
/// a tag pair are layout and are dropped.
pub fn inline_segments(cleaned: &str) -> Vec<MdNode> {
    let mut out = Vec::new();
    let mut cursor = 0;
    let mut after_open = false;
    for caps in TAG_RE.captures_iter(cleaned) {
        let Some(tag) = caps.get(0) else { continue };
        let closing = &caps[1] == "/";
        push_segment(&mut out, &cleaned[cursor..tag.start()], after_open, closing);
        out.push(MdNode::html(tag.as_str()));
        after_open = !closing;
        cursor = tag.end();
    }
    push_segment(&mut out, &cleaned[cursor..], after_open, false);
    out
}

fn push_segment(out: &mut Vec<MdNode>, text: &str, after_open: bool, before_close: bool) {
    let mut text = text;
    if after_open {
        text = text.trim_start_matches('\n');
    }
    if before_close {
        text = text.trim_end_matches('\n');
    }
    if !text.is_empty() {
        out.push(MdNode::text(text));
    }
}

/// Remove opening/closing markup of every tag outside the allow-list.
pub fn strip_unknown_tags(html: &str) -> String {
    let without_comments = strip_comments(html);
    TAG_RE
        .replace_all(&without_comments, |caps: &regex::Captures<'_>| {
            if is_allowed_tag(&caps[2]) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn strip_comments(html: &str) -> Cow<'_, str> {
    static ANY_COMMENT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
    ANY_COMMENT_RE.replace_all(html, "")
}

/// One tag found inside an inline HTML fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineTag {
    Open { name: String, color: Option<String> },
    Close { name: String },
    LineBreak,
}

/// Tags of an inline HTML node in order. Comments yield nothing.
pub fn inline_tags(html: &str) -> Vec<InlineTag> {
    let cleaned = strip_comments(html);
    TAG_RE
        .captures_iter(&cleaned)
        .map(|caps| {
            let name = caps[2].to_ascii_lowercase();
            if name == "br" {
                return InlineTag::LineBreak;
            }
            if &caps[1] == "/" {
                return InlineTag::Close { name };
            }
            let color = if name == "font" { color_attr(&caps[3]) } else { None };
            InlineTag::Open { name, color }
        })
        .collect()
}

fn color_attr(attrs: &str) -> Option<String> {
    let caps = COLOR_ATTR_RE.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}
