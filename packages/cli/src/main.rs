#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI for the WeaRisk toolchain.
//!
//! ```text
//! wearisk_cli explore
//! wearisk_cli collect
//! wearisk_cli serve
//! wearisk_cli export [--output map.geojson] [--risk-type flood_risk] [--timestamp latest]
//! ```
//!
//! Running with no subcommand opens a menu. Log output goes through
//! [`wearisk_cli_utils::init_logger`] so it does not tear the collection
//! progress bar.

mod collect;
mod explore;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use wearisk_config::AppConfig;
use wearisk_risk_models::{RiskType, TimestampSelection};

#[derive(Parser)]
#[command(name = "wearisk_cli", about = "French department climate-risk map toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore the risk map in the terminal
    Explore,
    /// Collect forecasts for every department into a fresh database
    Collect,
    /// Start the metrics server
    Serve,
    /// Write the styled map as GeoJSON
    Export {
        /// Output file
        #[arg(long, short, default_value = explore::DEFAULT_EXPORT_PATH)]
        output: PathBuf,
        /// Risk type to color by
        #[arg(long, default_value = "overall_risk")]
        risk_type: RiskType,
        /// Timestamp token, or "latest"
        #[arg(long, default_value = "latest")]
        timestamp: TimestampSelection,
    },
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Explore,
    Collect,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Explore, Self::Collect, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Explore => "Explore the risk map",
            Self::Collect => "Collect forecasts",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = wearisk_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Some(Commands::Explore) => explore::run(&config).await?,
        Some(Commands::Collect) => {
            collect::run(&multi, &config).await?;
        }
        Some(Commands::Serve) => {
            // The server uses actix-web's runtime, so it runs in a
            // blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(wearisk_server::run_server(config))
            })
            .await??;
        }
        Some(Commands::Export {
            output,
            risk_type,
            timestamp,
        }) => {
            explore::export(&config, &output, risk_type, timestamp).await?;
            println!("Wrote {}", output.display());
        }
        None => interactive(&multi, config).await?,
    }

    Ok(())
}

async fn interactive(
    multi: &wearisk_cli_utils::MultiProgress,
    config: AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("WeaRisk Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Explore => explore::run(&config).await?,
        Tool::Collect => {
            collect::run(multi, &config).await?;
        }
        Tool::Server => {
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new()
                    .block_on(wearisk_server::interactive::run(config))
            })
            .await??;
        }
    }

    Ok(())
}
