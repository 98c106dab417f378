/// Plugin registry. Composes plugins in registration order.
///
/// The parser and serializer consult the enabled plugins' rules in the order
/// the plugins were registered, so an earlier plugin shadows a later one.
use mdforge_core::EditorError;
use mdforge_markdown::{MarkdownParser, MarkdownSerializer, ParseOptions, ParseRuleRef, SerializeRuleRef};
use tracing::{debug, info, warn};

use crate::plugin::Plugin;

#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<LoadedPlugin>,
}

#[derive(Debug)]
pub struct LoadedPlugin {
    pub plugin: Plugin,
    pub enabled: bool,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.plugins.push(LoadedPlugin { plugin: crate::card::card_plugin(), enabled: true });
        registry
    }

    pub fn register(&mut self, plugin: Plugin) -> Result<(), EditorError> {
        plugin.manifest.validate().map_err(|e| EditorError::Plugin {
            plugin: plugin.id().to_string(),
            message: e.to_string(),
        })?;
        if self.get(plugin.id()).is_some() {
            return Err(EditorError::Plugin {
                plugin: plugin.id().to_string(),
                message: "already registered".to_string(),
            });
        }
        info!(
            "[Plugins] Registered: {} v{} ({} parse, {} serialize rules)",
            plugin.manifest.id,
            plugin.manifest.version,
            plugin.parse_rules.len(),
            plugin.serialize_rules.len()
        );
        self.plugins.push(LoadedPlugin { plugin, enabled: true });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&LoadedPlugin> {
        self.plugins.iter().find(|p| p.plugin.id() == id)
    }

    pub fn list(&self) -> Vec<&Plugin> {
        self.plugins.iter().map(|p| &p.plugin).collect()
    }

    pub fn enable(&mut self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    pub fn disable(&mut self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.plugins.iter_mut().find(|p| p.plugin.id() == id) {
            Some(p) => {
                p.enabled = enabled;
                debug!(plugin = id, enabled, "Plugin toggled");
                true
            }
            None => false,
        }
    }

    /// Enable exactly the listed plugins; unknown ids are logged and skipped.
    pub fn retain_enabled(&mut self, ids: &[String]) {
        for id in ids {
            if self.get(id).is_none() {
                warn!("[Plugins] Enabled plugin '{}' is not registered", id);
            }
        }
        for p in &mut self.plugins {
            p.enabled = ids.iter().any(|id| id == p.plugin.id());
        }
    }

    pub fn unload(&mut self, id: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p.plugin.id() != id);
        self.plugins.len() != before
    }

    fn enabled(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter().filter(|p| p.enabled).map(|p| &p.plugin)
    }

    /// Parse rules of all enabled plugins, flattened in registration order.
    pub fn parse_rules(&self) -> Vec<ParseRuleRef> {
        self.enabled().flat_map(|p| p.parse_rules.iter().cloned()).collect()
    }

    pub fn serialize_rules(&self) -> Vec<SerializeRuleRef> {
        self.enabled().flat_map(|p| p.serialize_rules.iter().cloned()).collect()
    }

    /// Custom element names rendered by the enabled plugins.
    pub fn elements(&self) -> Vec<String> {
        self.enabled().flat_map(|p| p.elements().iter().cloned()).collect()
    }

    pub fn parser(&self, options: ParseOptions) -> MarkdownParser {
        MarkdownParser::with_rules(self.parse_rules()).with_options(options)
    }

    pub fn serializer(&self) -> MarkdownSerializer {
        MarkdownSerializer::with_rules(self.serialize_rules())
    }
}
