//! Product Shipping CLI - Database migrations and scenario evaluation.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! psm-cli migrate
//!
//! # Evaluate a shipping scenario offline
//! psm-cli evaluate scenarios/pickup.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `evaluate` - Run the rate filter and pickup address resolver on a YAML scenario

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "psm-cli")]
#[command(author, version, about = "Product shipping methods CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Evaluate a shipping scenario file
    Evaluate {
        /// Path to the scenario YAML file
        scenario: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Evaluate { scenario } => commands::evaluate::run(&scenario)?,
    }
    Ok(())
}
