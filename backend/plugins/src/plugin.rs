//! A plugin bundles conversion rules with the custom element types it owns.

use std::fmt;
use std::sync::Arc;

use mdforge_markdown::{ParseRule, ParseRuleRef, SerializeRule, SerializeRuleRef};

use crate::manifest::PluginManifest;

#[derive(Clone)]
pub struct Plugin {
    pub manifest: PluginManifest,
    pub parse_rules: Vec<ParseRuleRef>,
    pub serialize_rules: Vec<SerializeRuleRef>,
}

impl Plugin {
    pub fn new(manifest: PluginManifest) -> Self {
        Self { manifest, parse_rules: Vec::new(), serialize_rules: Vec::new() }
    }

    pub fn with_parse_rule(mut self, rule: impl ParseRule + 'static) -> Self {
        self.parse_rules.push(Arc::new(rule));
        self
    }

    pub fn with_serialize_rule(mut self, rule: impl SerializeRule + 'static) -> Self {
        self.serialize_rules.push(Arc::new(rule));
        self
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn elements(&self) -> &[String] {
        &self.manifest.elements
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.manifest.id)
            .field("parse_rules", &self.parse_rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("serialize_rules", &self.serialize_rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}
