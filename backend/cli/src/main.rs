mod check_cmd;
mod config;
mod config_cmd;
mod convert_cmd;
mod input;
mod plugins_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdforge_config::{config_dir, config_file_path};
use mdforge_logging::init_logger;
use tracing::debug;

use config::Settings;

#[derive(Parser)]
#[command(name = "mdforge")]
#[command(about = "mdforge: Markdown to editor schema and back")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $MDFORGE_CONFIG_DIR/config.yaml or ~/.mdforge/config.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse Markdown and print the schema JSON
    Parse {
        /// Markdown file, or `-` for stdin
        file: PathBuf,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Render a schema JSON node array as Markdown
    Serialize {
        /// JSON file, or `-` for stdin
        file: PathBuf,
    },
    /// Check that Markdown files survive a parse/serialize round trip
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List registered plugins
    Plugins,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config
    Show,
    /// Write a config file with every default filled in
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Config { action: ConfigAction::Init { force } } = &cli.command {
        init_logger(None::<PathBuf>, "info", false);
        let path = cli.config.clone().unwrap_or_else(|| config_file_path(&config_dir()));
        config_cmd::init(&path, *force).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::load(cli.config.as_deref()).await?;
    init_logger(settings.log_dir(), settings.log_level(), settings.json_logs());
    debug!(config = %settings.path.display(), "Settings loaded");

    match cli.command {
        Commands::Parse { file, compact } => convert_cmd::parse(&settings, &file, compact).await?,
        Commands::Serialize { file } => convert_cmd::serialize(&settings, &file).await?,
        Commands::Check { files } => {
            let mut all_ok = true;
            for file in &files {
                all_ok &= check_cmd::run(&settings, file).await?;
            }
            if !all_ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Plugins => plugins_cmd::run(&settings),
        Commands::Config { action: ConfigAction::Show } => config_cmd::show(&settings)?,
        Commands::Config { action: ConfigAction::Init { .. } } => {}
    }

    Ok(ExitCode::SUCCESS)
}
