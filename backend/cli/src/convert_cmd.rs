//! `mdforge parse` and `mdforge serialize`.

use std::path::Path;

use anyhow::{Context, Result};
use mdforge_core::Document;
use tracing::info;

use crate::config::Settings;
use crate::input::read_source;

/// Print the schema JSON for a Markdown file.
pub async fn parse(settings: &Settings, file: &Path, compact: bool) -> Result<()> {
    let source = read_source(file).await?;
    println!("{}", parse_to_json(settings, &source, compact)?);
    Ok(())
}

/// Print Markdown for a schema JSON file (an array of nodes).
pub async fn serialize(settings: &Settings, file: &Path) -> Result<()> {
    let raw = read_source(file).await?;
    println!("{}", serialize_json(settings, &raw)?);
    Ok(())
}

pub fn parse_to_json(settings: &Settings, source: &str, compact: bool) -> Result<String> {
    let mut editor = settings.editor();
    editor.set_markdown(source);
    let nodes = editor.get_content();
    info!(blocks = nodes.len(), footnotes = editor.footnotes().len(), "Parsed markdown");
    let json = if compact { serde_json::to_string(&nodes) } else { serde_json::to_string_pretty(&nodes) };
    json.context("Failed to encode schema JSON")
}

/// Hand-written JSON may break schema invariants; the editor normalizes it
/// on the way in.
pub fn serialize_json(settings: &Settings, raw: &str) -> Result<String> {
    let document: Document = serde_json::from_str(raw).context("Input is not a schema node array")?;
    let mut editor = settings.editor();
    editor.set_content(document.children);
    Ok(editor.get_markdown())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdforge_config::{apply_all_defaults, MdforgeConfig};
    use std::path::PathBuf;

    fn settings() -> Settings {
        Settings { path: PathBuf::from("config.yaml"), config: apply_all_defaults(MdforgeConfig::default()) }
    }

    #[test]
    fn parse_then_serialize_through_json() {
        let settings = settings();
        let json = parse_to_json(&settings, "# Title\n\n- a\n- b", true).unwrap();
        assert!(json.starts_with(r#"[{"type":"heading","level":1"#));
        assert_eq!(serialize_json(&settings, &json).unwrap(), "# Title\n\n- a\n- b");
    }

    #[test]
    fn serialize_normalizes_loose_json() {
        let raw = r#"[{"type":"paragraph","children":[{"text":"a"},{"text":"b"}]}]"#;
        assert_eq!(serialize_json(&settings(), raw).unwrap(), "ab");
    }

    #[test]
    fn rejects_non_array_input() {
        let err = serialize_json(&settings(), r#"{"type":"paragraph"}"#).unwrap_err();
        assert!(err.to_string().contains("schema node array"));
    }
}
