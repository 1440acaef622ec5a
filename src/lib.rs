pub mod cli;
pub mod core;
pub mod providers;

use crate::core::Source;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub use cli::download::DownloadArgs;

pub enum AppCommand {
    Download(DownloadArgs),
    Markets {
        source: Source,
        output: Option<PathBuf>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Market quote downloader starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Download(args) => cli::download::run(&args, &config).await,
        AppCommand::Markets { source, output } => {
            cli::markets::run(source, output.as_deref(), &config).await
        }
    }
}
