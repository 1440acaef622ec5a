use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use marketquote::core::log::init_logging;
use marketquote::{AppCommand, DownloadArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Download historical quotes for one or more symbols
    Download {
        /// Symbols to download
        symbols: Vec<String>,

        /// Read additional symbols from a file, one per line
        #[arg(long)]
        infile: Option<PathBuf>,

        /// Data source: yahoo, tiingo, tiingo-crypto, coinbase, bittrex, binance
        #[arg(short, long, default_value = "yahoo")]
        source: String,

        /// Start date (YYYY-MM-DD[ HH:MM[:SS]])
        #[arg(long)]
        start: Option<String>,

        /// End date, defaults to now
        #[arg(long)]
        end: Option<String>,

        /// Years of history to fetch when no start date is given
        #[arg(long, default_value_t = 5)]
        years: u32,

        /// Bar period: 1m 3m 5m 15m 30m 1h 2h 4h 6h 8h 12h d 3d w m
        #[arg(short, long, default_value = "d")]
        period: String,

        /// Output format: csv, json, hs (highstock), ami (amibroker)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Adjust prices for splits and dividends
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        adjust: bool,

        /// Write one file per symbol into the output directory
        #[arg(long)]
        all: bool,

        /// Output file (or directory with --all); '-' or omitted for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the tradeable symbols of an exchange
    Markets {
        /// Source: tiingo-crypto, coinbase, bittrex, binance
        source: String,

        /// Output file; '-' or omitted for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn into_app_command(self) -> Result<AppCommand> {
        match self {
            Commands::Download {
                symbols,
                infile,
                source,
                start,
                end,
                years,
                period,
                format,
                adjust,
                all,
                output,
            } => Ok(AppCommand::Download(DownloadArgs {
                symbols,
                infile,
                source: source.parse()?,
                start,
                end,
                years,
                period: period.parse()?,
                format: format.parse()?,
                adjust,
                all,
                output,
            })),
            Commands::Markets { source, output } => Ok(AppCommand::Markets {
                source: source.parse()?,
                output,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => marketquote::cli::setup::setup(),
        Some(cmd) => match cmd.into_app_command() {
            Ok(command) => marketquote::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
