use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendex::config::Config;

mod commands;

use commands::{IndexArgs, RecordArgs};

#[derive(Parser)]
#[command(
    name = "trendex",
    version,
    about = "Build a seasonally adjusted search trends index from keyword queries",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json), overrides the configuration
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from recorded query responses
    Build {
        #[command(flatten)]
        index: IndexArgs,

        /// Write the full result as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply the configured pacing, rate limit and retries to every query
        #[arg(long, default_value = "false")]
        paced: bool,
    },

    /// Show dates, time chunks, search groups and required queries
    Plan {
        #[command(flatten)]
        index: IndexArgs,

        /// Print the plan as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Store one interest-over-time response for a query
    Record {
        #[command(flatten)]
        record: RecordArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!("trendex starting");

    match cli.command {
        Commands::Build {
            index,
            output,
            paced,
        } => {
            index.apply(&mut config);
            config.validate()?;
            tracing::info!(
                keywords = config.index.keywords.len(),
                frequency = %config.index.frequency,
                output = ?output,
                paced = %paced,
                "Starting build command"
            );
            commands::build(&config, output, paced).await?;
        }

        Commands::Plan { index, json } => {
            index.apply(&mut config);
            config.validate()?;
            tracing::info!(json = %json, "Starting plan command");
            commands::plan(&config, json).await?;
        }

        Commands::Record { record } => {
            tracing::info!(
                terms = ?record.terms,
                input = %record.input.display(),
                "Starting record command"
            );
            commands::record(&config, record).await?;
        }
    }

    tracing::info!("trendex completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("trendex=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("trendex={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
