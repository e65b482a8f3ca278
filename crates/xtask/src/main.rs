//! Development tasks for the skirmish workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{Matrix, PlanItem, Validate};
use tracing_subscriber::EnvFilter;

/// Development tasks for the skirmish workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for skirmish content and plans", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print the plan an item builds for an application phase
    Plan(PlanItem),

    /// Load an item catalog and check every condition against the trigger matrix
    Validate(Validate),

    /// List condition events and the update actions they may fire
    Matrix(Matrix),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan(cmd) => cmd.execute(),
        Command::Validate(cmd) => cmd.execute(),
        Command::Matrix(cmd) => cmd.execute(),
    }
}
