// ABOUTME: Trainload CLI - computes stats, training loads and peaks for an activity bundle
// ABOUTME: Reads a JSON bundle, runs the processors against in-memory stores, prints JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Per-activity stats (power, NP/XP, TSS, HR stress, ascent)
//! trainload-cli stats --bundle athlete.json
//!
//! # Stats plus ATL/CTL for every activity
//! trainload-cli load --bundle athlete.json
//!
//! # Peak power/NP/XP/pace/heart rate for selected periods
//! trainload-cli peaks --bundle athlete.json --periods 5,60,300,1200
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use trainload::config::ProcessingConfig;
use trainload::logging::LoggingConfig;

#[derive(Parser)]
#[command(
    name = "trainload-cli",
    about = "Activity metrics and training load calculator",
    long_about = "Computes per-activity stats, ATL/CTL training loads and peak efforts from a JSON activity bundle."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Compute per-activity stats
    Stats {
        /// Path to the activity bundle
        #[arg(long)]
        bundle: PathBuf,
    },

    /// Compute stats and ATL/CTL training loads
    Load {
        /// Path to the activity bundle
        #[arg(long)]
        bundle: PathBuf,
    },

    /// Search peak efforts
    Peaks {
        /// Path to the activity bundle
        #[arg(long)]
        bundle: PathBuf,

        /// Periods in seconds (comma-separated); defaults to the standard set
        #[arg(long, value_delimiter = ',')]
        periods: Option<Vec<f64>>,

        /// Distances in meters (comma-separated); defaults to the standard set
        #[arg(long, value_delimiter = ',')]
        distances: Option<Vec<f64>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    let config = ProcessingConfig::from_env()?;
    info!("Trainload CLI");

    let output = match cli.command {
        Command::Stats { bundle } => commands::stats(&bundle, &config).await?,
        Command::Load { bundle } => commands::load(&bundle, &config).await?,
        Command::Peaks {
            bundle,
            periods,
            distances,
        } => commands::peaks(&bundle, periods, distances).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
