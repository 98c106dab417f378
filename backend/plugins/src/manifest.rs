/// Plugin manifest describing an mdforge plugin bundle.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Full plugin manifest (parsed from `mdforge-plugin.json` or built in code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub author: Option<String>,
    /// Custom element type names this plugin renders on the host side.
    #[serde(default)]
    pub elements: Vec<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl PluginManifest {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: default_version(),
            description: String::new(),
            author: None,
            elements: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let manifest: PluginManifest =
            serde_json::from_str(raw).context("parse plugin manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest for required fields.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            anyhow::bail!("Plugin manifest missing 'id'");
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("Plugin manifest missing 'name'");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let manifest = PluginManifest::from_json(r#"{"id":"mermaid","name":"Mermaid","elements":["mermaid"]}"#).unwrap();
        assert_eq!(manifest.version, "0.1.0");
        assert_eq!(manifest.elements, vec!["mermaid".to_string()]);
        assert!(manifest.author.is_none());
    }

    #[test]
    fn rejects_missing_identity() {
        let err = PluginManifest::from_json(r#"{"id":"","name":"Nameless"}"#).unwrap_err();
        assert!(err.to_string().contains("'id'"));
        assert!(PluginManifest::new("x", " ").validate().is_err());
        assert!(PluginManifest::from_json("not json").is_err());
    }
}
