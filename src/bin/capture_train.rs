//! Train agents against the simulated arena.
//!
//! ```text
//! capture-train [config.json]
//! ```
//!
//! The optional JSON file holds `episodes`, a `training` section
//! ([`TrainingConfig`]) and an `arena` section ([`ArenaConfig`]); omitted
//! fields keep their defaults. Log verbosity follows `RUST_LOG`.

use serde::Deserialize;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use capture_rl::environment::{ArenaConfig, SimulatedArena};
use capture_rl::error::Result;
use capture_rl::training::{TrainingConfig, TrainingManager};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunConfig {
    episodes: usize,
    training: TrainingConfig,
    arena: ArenaConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            episodes: 2000,
            training: TrainingConfig {
                save_interval: 200,
                eval_interval: 100,
                ..TrainingConfig::default()
            },
            arena: ArenaConfig::default(),
        }
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "loading configuration");
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str::<RunConfig>(&data)?
        }
        None => RunConfig::default(),
    };

    let arena_config = ArenaConfig {
        num_agents: config.training.num_agents,
        grid_size: config.training.encoder.grid_size,
        ..config.arena
    };
    let arena = SimulatedArena::new(arena_config)?;
    let mut manager = TrainingManager::new(arena, config.training)?;
    let episodes = manager.train(config.episodes)?.episodes();
    info!(
        episodes,
        save_dir = %manager.config().save_dir.display(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("capture_rl=info,capture_train=info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
