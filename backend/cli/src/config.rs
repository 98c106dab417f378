//! Runtime settings for the CLI, derived from the YAML config.

use std::path::{Path, PathBuf};

use anyhow::Result;
use mdforge_config::{config_dir, config_file_path, load_and_prepare, MarkdownConfig, MdforgeConfig};
use mdforge_editor::{EditorOptions, EditorStore};
use mdforge_markdown::ParseOptions;
use mdforge_plugins::PluginRegistry;

/// Fully defaulted config plus the file it came from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub path: PathBuf,
    pub config: MdforgeConfig,
}

impl Settings {
    /// Load `path`, or `<config_dir>/config.yaml` when none is given.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(|| config_file_path(&config_dir()), Path::to_path_buf);
        let config = load_and_prepare(&path).await?;
        Ok(Self { path, config })
    }

    pub fn parse_options(&self) -> ParseOptions {
        self.config.markdown.as_ref().map(parse_options).unwrap_or_default()
    }

    /// Built-in plugins, narrowed to the ones the config enables.
    pub fn registry(&self) -> PluginRegistry {
        let mut registry = PluginRegistry::with_builtins();
        if let Some(enabled) = self.config.plugins.as_ref().and_then(|p| p.enabled.as_ref()) {
            registry.retain_enabled(enabled);
        }
        registry
    }

    /// A fresh editor session wired to the configured plugins and extensions.
    pub fn editor(&self) -> EditorStore {
        let options = self.config.editor.as_ref().map(EditorOptions::from).unwrap_or_default();
        let registry = self.registry();
        EditorStore::new(options).with_converters(registry.parser(self.parse_options()), registry.serializer())
    }

    pub fn log_level(&self) -> &str {
        self.config.logging.as_ref().and_then(|l| l.level.as_deref()).unwrap_or("info")
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.config.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.config.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

fn parse_options(markdown: &MarkdownConfig) -> ParseOptions {
    let defaults = ParseOptions::default();
    ParseOptions {
        gfm: markdown.gfm.unwrap_or(defaults.gfm),
        footnotes: markdown.footnotes.unwrap_or(defaults.footnotes),
        think_tags: markdown.think_tags.unwrap_or(defaults.think_tags),
    }
}
