//! mtdb - Command-line tool for the model-test data service
//!
//! Lists campaigns, sensors, tests and time series, reads sampled data and
//! statistics, and manages the local data cache.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mtdb_client::config::CacheConfig;
use mtdb_client::{ClientConfig, Id, MtdbClient};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{DataArgs, ListArgs, WindowArgs};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "mtdb")]
#[command(author, version, about = "Model-test data service CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// YAML configuration file (MTDB_* environment variables otherwise)
    #[arg(short, long, env = "MTDB_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List campaigns
    Campaigns(ListArgs),

    /// List sensors
    Sensors(ListArgs),

    /// List tests of every kind
    Tests(ListArgs),

    /// List time series
    Timeseries(ListArgs),

    /// Read sampled data of a time series
    Data {
        /// Time series ID
        id: Id,

        #[command(flatten)]
        args: DataArgs,
    },

    /// Show server-computed statistics of a time series
    Stats {
        /// Time series ID
        id: Id,

        #[command(flatten)]
        window: WindowArgs,

        /// Bypass the data cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Manage the local data cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Show where the cache lives and how many entries it holds
    Info,
    /// Delete the persisted cache
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref());

    // Set up logging: --verbose, then RUST_LOG, then the configured level
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let level = config
            .as_ref()
            .ok()
            .and_then(|c| c.log_level.clone())
            .unwrap_or_else(|| "warn".to_string());
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    match &cli.command {
        Commands::Campaigns(args) => {
            let client = create_client(config?)?;
            commands::list_campaigns(&client, args, &ctx).await?;
        }

        Commands::Sensors(args) => {
            let client = create_client(config?)?;
            commands::list_sensors(&client, args, &ctx).await?;
        }

        Commands::Tests(args) => {
            let client = create_client(config?)?;
            commands::list_tests(&client, args, &ctx).await?;
        }

        Commands::Timeseries(args) => {
            let client = create_client(config?)?;
            commands::list_timeseries(&client, args, &ctx).await?;
        }

        Commands::Data { id, args } => {
            let client = create_client(config?)?;
            commands::data(&client, *id, args, &ctx).await?;
            client.flush_cache().context("Failed to write cache")?;
        }

        Commands::Stats {
            id,
            window,
            no_cache,
        } => {
            let client = create_client(config?)?;
            commands::stats(&client, *id, window, !no_cache, &ctx).await?;
            client.flush_cache().context("Failed to write cache")?;
        }

        Commands::Cache { action } => {
            let cache = cache_config(cli.config.is_some(), config)?;
            match action {
                CacheCommand::Info => commands::cache_info(&cache, &ctx)?,
                CacheCommand::Clear => commands::cache_clear(&cache, &ctx)?,
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => ClientConfig::from_env().context("Failed to read MTDB_* environment"),
    }
}

/// Cache settings for offline cache commands
///
/// Without an explicit config file, missing credentials fall back to the
/// default cache location.
fn cache_config(explicit: bool, config: Result<ClientConfig>) -> Result<CacheConfig> {
    match config {
        Ok(config) => Ok(config.cache),
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::debug!("Using default cache settings: {:#}", e);
            Ok(CacheConfig::default())
        }
    }
}

fn create_client(config: ClientConfig) -> Result<MtdbClient> {
    MtdbClient::new(config).context("Failed to create client")
}
