//! RADEM instrument data pipeline.
//!
//! Four sequential stages over a shared data root:
//! - acquire: mirror upstream archives (skip-if-present, timestamp-checked)
//! - extract: decompress archives into decoded record files (always refresh)
//! - ingest: parse, normalize, persist and verify channel tables
//! - trajectory: window ephemeris samples and persist them as a table
//!
//! Stages run to completion one after another; there is no overlap and no
//! shared state beyond the filesystem directories each stage owns.

mod config;
mod extract;
mod ingest;
mod mirror;
mod trajectory;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::PipelineConfig;
use radem_common::{DataLayout, RefreshPolicy};

#[derive(Parser, Debug)]
#[command(name = "radem-pipeline")]
#[command(about = "RADEM instrument data acquisition and ingestion pipeline")]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long, env = "RADEM_CONFIG", default_value = "config/pipeline.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror upstream archives into the raw directory
    Acquire,
    /// Decompress mirrored archives into decoded record files
    Extract,
    /// Parse, normalize, persist and verify channel tables
    Ingest,
    /// Acquire, extract and ingest in sequence
    Run,
    /// Export a trajectory table from an ephemeris sample file
    Trajectory {
        /// Ephemeris export file (time,distance_km,lat_deg,lon_deg)
        #[arg(long)]
        ephemeris: PathBuf,

        /// Observer vehicle name
        #[arg(long, default_value = "JUICE")]
        observer: String,

        /// Target body name
        #[arg(long)]
        target: String,

        /// Window start (ISO 8601)
        #[arg(long)]
        start: String,

        /// Window stop (ISO 8601)
        #[arg(long)]
        stop: String,

        /// Sampling interval in minutes
        #[arg(long, default_value = "60")]
        step_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = PipelineConfig::load(&args.config)?;
    let layout = DataLayout::new(&config.data_root);
    layout
        .ensure_dirs()
        .with_context(|| format!("Failed to create data root {}", config.data_root.display()))?;

    info!(
        source = %config.source.id,
        data_root = %config.data_root.display(),
        "Starting radem-pipeline"
    );

    match args.command {
        Command::Acquire => {
            mirror::mirror(&config.source, &layout).await?;
        }
        Command::Extract => {
            extract::extract(
                &layout.raw(),
                &layout.extracted(),
                &config.source.suffix,
                RefreshPolicy::AlwaysOverwrite,
            )?;
        }
        Command::Ingest => {
            ingest::run_ingest(&config, &layout)?;
        }
        Command::Run => {
            mirror::mirror(&config.source, &layout).await?;
            extract::extract(
                &layout.raw(),
                &layout.extracted(),
                &config.source.suffix,
                RefreshPolicy::AlwaysOverwrite,
            )?;
            ingest::run_ingest(&config, &layout)?;
        }
        Command::Trajectory {
            ephemeris,
            observer,
            target,
            start,
            stop,
            step_minutes,
        } => {
            let start = radem_common::time::parse_datetime(&start)
                .context("Invalid --start")?;
            let stop = radem_common::time::parse_datetime(&stop)
                .context("Invalid --stop")?;
            trajectory::run_trajectory(
                &layout,
                &ephemeris,
                &observer,
                &target,
                start,
                stop,
                step_minutes,
            )
            .await?;
        }
    }

    Ok(())
}
