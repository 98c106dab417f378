//! Config validation with path-qualified messages.

use std::collections::HashSet;

use crate::schema::MdforgeConfig;
use thiserror::Error;

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

const MAX_HISTORY_LIMIT: usize = 10_000;

const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

pub fn validate(config: &MdforgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_editor(config, &mut report);
    validate_plugins(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_editor(config: &MdforgeConfig, report: &mut ValidationReport) {
    let Some(editor) = &config.editor else { return };
    match editor.history_limit {
        Some(0) => report.warn("editor.historyLimit", "History limit is 0; undo is disabled"),
        Some(n) if n > MAX_HISTORY_LIMIT => report.warn(
            "editor.historyLimit",
            format!("History limit {n} keeps a full document copy per step; consider <= {MAX_HISTORY_LIMIT}"),
        ),
        _ => {}
    }
    if let Some(ms) = editor.debounce_ms.filter(|ms| *ms > MAX_DEBOUNCE_MS) {
        report.warn("editor.debounceMs", format!("Debounce of {ms}ms delays change notifications noticeably"));
    }
}

fn validate_plugins(config: &MdforgeConfig, report: &mut ValidationReport) {
    let Some(enabled) = config.plugins.as_ref().and_then(|p| p.enabled.as_ref()) else { return };
    let mut seen = HashSet::new();
    for (i, id) in enabled.iter().enumerate() {
        if id.trim().is_empty() {
            report.error(format!("plugins.enabled[{i}]"), "Plugin ID cannot be empty");
        } else if !seen.insert(id.as_str()) {
            report.warn(format!("plugins.enabled[{i}]"), format!("Plugin '{id}' is listed more than once"));
        }
    }
}

/// A level is either a bare level name or a comma-separated list of
/// `EnvFilter` directives such as `mdforge_editor=debug`.
fn validate_logging(config: &MdforgeConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        let ok = level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or_default().trim();
            LEVELS.contains(&level.to_ascii_lowercase().as_str())
        });
        if !ok {
            report.error("logging.level", format!("Unknown log level '{level}'"));
        }
    }
    if logging.dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
        report.error("logging.dir", "Log directory cannot be empty; omit it to disable file logging");
    }
}
