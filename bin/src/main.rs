//! candlefetch CLI - Crypto OHLCV candle downloader with background jobs.

use anyhow::{Context, Result};
use candlefetch_jobs::{JobRequest, JobStatus};
use candlefetch_server::{LogFormat, ServerConfig, init_logging};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "candlefetch")]
#[command(about = "Crypto OHLCV candle downloader with background jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and WebSocket API
    Serve {
        /// Bind host (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// CSV output folder (overrides DATA_FOLDER)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Job log folder (overrides STORAGE_FOLDER)
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },

    /// Download candles for one symbol in the foreground
    Fetch {
        /// Provider symbol (e.g., BINANCE_SPOT_BTC_USDT)
        symbol: String,

        /// Period identifier (e.g., 1DAY, 1HRS, 5min)
        #[arg(short, long)]
        period: String,

        /// Start date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(short, long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(short, long)]
        end: Option<String>,

        /// Maximum number of candles when the window is open-ended
        #[arg(short, long)]
        limit: Option<u32>,

        /// CSV output folder (overrides DATA_FOLDER)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Inspect and delete recorded jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Show provider metadata
    Meta {
        #[command(subcommand)]
        action: MetaAction,
    },
}

/// Actions on the job log.
#[derive(Subcommand)]
enum JobsAction {
    /// List jobs, newest first
    List {
        /// Only show jobs with this status (pending, running, completed, failed)
        #[arg(short, long)]
        status: Option<JobStatus>,
    },

    /// Show one job in detail
    Show {
        /// Job ID
        job_id: String,
    },

    /// Delete a job and its CSV file
    Delete {
        /// Job ID. Prompts for a selection when omitted.
        job_id: Option<String>,
    },
}

/// Provider metadata listings.
#[derive(Subcommand)]
enum MetaAction {
    /// List exchanges
    Exchanges,

    /// List symbols
    Symbols {
        /// Substring to match against symbol or base asset
        #[arg(short, long, default_value = "")]
        search: String,

        /// Exchange identifier to filter by
        #[arg(short, long, default_value = "")]
        exchange: String,
    },

    /// List supported resolutions
    Resolutions,
}

/// Log level for a `-v` count, given the level used without flags.
fn log_level(verbose: u8, default: &str) -> String {
    match verbose {
        0 => default.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;

    match command {
        Commands::Serve {
            host,
            port,
            data_dir,
            storage_dir,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(dir) = storage_dir {
                config.storage_dir = dir;
            }
            init_logging(&log_level(cli.verbose, &config.log_level), config.log_format)
                .context("Failed to initialize logging")?;
            commands::serve::serve(config).await
        }
        Commands::Fetch {
            symbol,
            period,
            start,
            end,
            limit,
            data_dir,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            // Progress goes to the bar; only warnings reach the log by default.
            init_logging(&log_level(cli.verbose, "warn"), LogFormat::Compact)
                .context("Failed to initialize logging")?;
            let request = JobRequest::new(symbol, period)
                .with_window(start, end)
                .with_limit(limit);
            commands::fetch::fetch(&config, request, cli.quiet).await
        }
        Commands::Jobs { action } => {
            init_logging(&log_level(cli.verbose, "warn"), LogFormat::Compact)
                .context("Failed to initialize logging")?;
            match action {
                JobsAction::List { status } => commands::jobs::list_jobs(&config, status),
                JobsAction::Show { job_id } => commands::jobs::show_job(&config, &job_id),
                JobsAction::Delete { job_id } => {
                    commands::jobs::delete_job(&config, job_id.as_deref()).await
                }
            }
        }
        Commands::Meta { action } => {
            init_logging(&log_level(cli.verbose, "warn"), LogFormat::Compact)
                .context("Failed to initialize logging")?;
            match action {
                MetaAction::Exchanges => commands::meta::list_exchanges(&config).await,
                MetaAction::Symbols { search, exchange } => {
                    commands::meta::list_symbols(&config, &search, &exchange).await
                }
                MetaAction::Resolutions => commands::meta::list_resolutions(&config).await,
            }
        }
    }
}
