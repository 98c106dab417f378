pub mod card;
pub mod manifest;
pub mod plugin;
pub mod registry;

pub use card::{card_plugin, CARD_ELEMENT};
pub use manifest::PluginManifest;
pub use plugin::Plugin;
pub use registry::PluginRegistry;
