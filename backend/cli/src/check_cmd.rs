//! `mdforge check`: does a file survive parse → serialize → parse?

use std::path::Path;

use anyhow::Result;
use mdforge_editor::EditorStore;

use crate::config::Settings;
use crate::input::read_source;
use crate::terminal_output::{note_error, note_success, note_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTrip {
    /// Re-parsing the rendered Markdown yields the same schema tree.
    pub idempotent: bool,
    /// The rendered Markdown equals the input, ignoring trailing whitespace.
    pub identical: bool,
    /// First line where input and rendered Markdown differ (1-based).
    pub first_difference: Option<LineDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    pub line: usize,
    pub input: String,
    pub rendered: String,
}

pub fn round_trip(editor: &mut EditorStore, source: &str) -> RoundTrip {
    editor.set_markdown(source);
    let first = editor.get_content();
    let rendered = editor.get_markdown();
    editor.set_markdown(&rendered);
    let second = editor.get_content();

    let identical = source.trim_end() == rendered.trim_end();
    RoundTrip {
        idempotent: first == second,
        identical,
        first_difference: if identical { None } else { first_difference(source, &rendered) },
    }
}

fn first_difference(input: &str, rendered: &str) -> Option<LineDiff> {
    let mut a = input.trim_end().lines();
    let mut b = rendered.trim_end().lines();
    let mut line = 1;
    loop {
        match (a.next(), b.next()) {
            (None, None) => return None,
            (x, y) if x != y => {
                return Some(LineDiff {
                    line,
                    input: x.unwrap_or_default().to_string(),
                    rendered: y.unwrap_or_default().to_string(),
                })
            }
            _ => line += 1,
        }
    }
}

/// Returns whether the round trip is idempotent.
pub async fn run(settings: &Settings, file: &Path) -> Result<bool> {
    let source = read_source(file).await?;
    let report = round_trip(&mut settings.editor(), &source);

    if report.identical {
        note_success(&format!("{}: round trip is byte-identical", file.display()));
    } else if report.idempotent {
        note_success(&format!("{}: round trip is idempotent", file.display()));
        if let Some(diff) = &report.first_difference {
            note_warn(&format!(
                "output differs from input starting at line {}:\n  - {}\n  + {}",
                diff.line, diff.input, diff.rendered
            ));
        }
    } else {
        note_error(&format!("{}: re-parsing the output changes the document", file.display()));
    }
    Ok(report.idempotent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_markdown_is_identical() {
        let report = round_trip(&mut EditorStore::default(), "# Title\n\n- a\n- b\n");
        assert!(report.idempotent);
        assert!(report.identical);
        assert_eq!(report.first_difference, None);
    }

    #[test]
    fn alternate_syntax_is_idempotent_but_rewritten() {
        let report = round_trip(&mut EditorStore::default(), "Intro\n\n* one\n* two");
        assert!(report.idempotent);
        assert!(!report.identical);
        let diff = report.first_difference.unwrap();
        assert_eq!(diff.line, 3);
        assert_eq!(diff.input, "* one");
        assert_eq!(diff.rendered, "- one");
    }
}
