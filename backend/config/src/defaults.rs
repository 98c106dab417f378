//! Config defaults: fills unset fields of a parsed config.

use crate::schema::{EditorConfig, LoggingConfig, MarkdownConfig, MdforgeConfig, PluginsConfig};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Plugins enabled when the config does not list any.
pub const DEFAULT_PLUGINS: &[&str] = &["card"];

pub fn apply_all_defaults(config: MdforgeConfig) -> MdforgeConfig {
    let config = apply_editor_defaults(config);
    let config = apply_markdown_defaults(config);
    let config = apply_plugin_defaults(config);
    apply_logging_defaults(config)
}

fn apply_editor_defaults(mut config: MdforgeConfig) -> MdforgeConfig {
    let editor = config.editor.get_or_insert_with(EditorConfig::default);
    editor.history_limit.get_or_insert(DEFAULT_HISTORY_LIMIT);
    editor.debounce_ms.get_or_insert(DEFAULT_DEBOUNCE_MS);
    editor.read_only.get_or_insert(false);
    config
}

/// All syntax extensions are on unless switched off.
fn apply_markdown_defaults(mut config: MdforgeConfig) -> MdforgeConfig {
    let markdown = config.markdown.get_or_insert_with(MarkdownConfig::default);
    markdown.gfm.get_or_insert(true);
    markdown.footnotes.get_or_insert(true);
    markdown.think_tags.get_or_insert(true);
    config
}

fn apply_plugin_defaults(mut config: MdforgeConfig) -> MdforgeConfig {
    let plugins = config.plugins.get_or_insert_with(PluginsConfig::default);
    plugins
        .enabled
        .get_or_insert_with(|| DEFAULT_PLUGINS.iter().map(|id| id.to_string()).collect());
    config
}

fn apply_logging_defaults(mut config: MdforgeConfig) -> MdforgeConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
