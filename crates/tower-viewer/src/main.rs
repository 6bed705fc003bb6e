//! Tower Viewer - Main entry point
//!
//! Loads the building description, then opens the 3D viewer.

mod app;
mod config;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tower_core::{load_floors, FloorSelection, SpaceData};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tower-viewer")]
#[command(about = "Explore a residential tower floor by floor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tower.toml")]
    config: PathBuf,

    /// Floor metadata JSON (overrides the configured path)
    #[arg(short, long)]
    floors: Option<PathBuf>,

    /// Floor to show at startup; -1 shows every floor
    #[arg(short, long, allow_negative_numbers = true)]
    initial_floor: Option<i32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
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

    info!("Tower Viewer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(floors) = args.floors {
        config.assets.floors = floors;
    }
    if let Some(initial_floor) = args.initial_floor {
        config.viewer.initial_floor = initial_floor;
    }

    let floors = load_floors(&config.assets.floors)
        .with_context(|| format!("Failed to read floors from {}", config.assets.floors.display()))?;

    // Labels fall back to placeholders without unit data
    let spaces = match SpaceData::load(&config.assets.spaces) {
        Ok(spaces) => spaces,
        Err(e) => {
            warn!(path = %config.assets.spaces.display(), "Unit data unavailable: {}", e);
            SpaceData::default()
        }
    };

    let initial: FloorSelection = config.viewer.initial_selection();
    info!(
        floors = floors.len(),
        units = spaces.len(),
        initial = %initial,
        "Building loaded"
    );

    app::run(config, floors, spaces)
}
