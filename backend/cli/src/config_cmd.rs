//! `mdforge config`: inspect or initialise the config file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use mdforge_config::{apply_all_defaults, write_config, MdforgeConfig};
use tokio::fs;

use crate::config::Settings;
use crate::terminal_output::note_success;

/// Print the effective config (file values plus defaults) as YAML.
pub fn show(settings: &Settings) -> Result<()> {
    let yaml = serde_yaml::to_string(&settings.config).context("Failed to encode config")?;
    println!("# {}", settings.path.display());
    print!("{yaml}");
    Ok(())
}

/// Write a fully defaulted config to `path`. The existing file is not
/// loaded first, so a broken config can be replaced with `--force`.
pub async fn init(path: &Path, force: bool) -> Result<()> {
    if !force && fs::try_exists(path).await.unwrap_or(false) {
        bail!("{} already exists; pass --force to overwrite it", path.display());
    }
    write_config(&apply_all_defaults(MdforgeConfig::default()), path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}
