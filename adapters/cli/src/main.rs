#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Kugelpanzer match.

mod scenario;
mod simulation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    scenario::{default_random_seed, Scenario, DEFAULT_SCENARIO},
    simulation::Arena,
};

/// Command-line arguments for the battle arena.
#[derive(Debug, Parser)]
#[command(name = "battle-arena", version, about = "Runs a headless tank battle")]
struct Cli {
    /// TOML scenario to run instead of the built-in duel.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Overrides the number of ticks declared by the scenario.
    #[arg(long)]
    ticks: Option<u64>,
    /// Seed for random input drivers that do not declare their own.
    #[arg(long)]
    seed: Option<u64>,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entry point for the battle arena command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::parse(DEFAULT_SCENARIO).context("built-in scenario is invalid")?,
    };
    let ticks = cli.ticks.unwrap_or(scenario.ticks);
    let seed = cli.seed.unwrap_or_else(default_random_seed);

    info!(ticks, seed, players = scenario.players.len(), "starting match");
    let mut arena = Arena::from_scenario(&scenario, seed);
    let report = arena.run(ticks).clone();

    println!("Simulated {} ticks", report.ticks);
    println!(
        "  moves: {} accepted, {} rejected",
        report.moves, report.rejected_moves
    );
    println!(
        "  projectiles: {} fired, {} expired, {} hits",
        report.projectiles_fired,
        report.projectiles_expired,
        report.hits.len()
    );
    println!("  draw calls: {}", report.draw_calls);
    for hit in &report.hits {
        println!(
            "  tick {:>4}: unit {} hit unit {} (damage x{:.2})",
            hit.tick,
            hit.owner.get(),
            hit.target.get(),
            hit.damage_scale
        );
    }

    println!("Roster:");
    for entry in arena.roster() {
        let state = match entry.snapshot {
            Some(unit) => format!(
                "at ({:.2}, {:.2}) facing {:.2} rad",
                unit.position.x, unit.position.y, unit.rotation
            ),
            None => String::from("gone"),
        };
        println!(
            "  player {}: {} by {} {}",
            entry.player.get(),
            entry.unit_name,
            entry.author,
            state
        );
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
