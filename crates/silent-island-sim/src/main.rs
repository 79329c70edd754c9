//! Headless Silent Island simulator.
//!
//! Seats simulated participants in a room, plays every round through the
//! room's command dispatcher and prints the endings.

mod driver;
mod strategy;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use silent_island_room::RoomConfig;

use crate::driver::SimOptions;
use crate::strategy::Strategy;

/// Plays a headless Silent Island game
#[derive(Debug, Parser)]
#[command(name = "silent-island-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Seed for the room, the deal, coin flips and strategy draws
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of participants
    #[arg(long, default_value_t = 6)]
    players: usize,

    /// How participants vote
    #[arg(long, value_enum, default_value_t = Strategy::Random)]
    strategy: Strategy,

    /// Room configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the endings as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RoomConfig::from_json_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => RoomConfig::default(),
    };

    let ending = driver::run(
        config,
        &SimOptions {
            seed: cli.seed,
            players: cli.players,
            strategy: cli.strategy,
        },
    )?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&ending)?);
        return Ok(());
    }

    println!(
        "social ending: {:?} (pressure {}, circulation {})",
        ending.social, ending.metrics.pressure, ending.metrics.circulation
    );
    for personal in &ending.personal {
        let role = personal
            .role
            .map_or_else(|| "-".to_owned(), |r| format!("{r:?}"));
        println!(
            "  {:<10} {:<13} risk {:>2}  {:?}",
            personal.name, role, personal.risk, personal.ending
        );
    }
    Ok(())
}
