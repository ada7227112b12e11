#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Worldforge simulation headlessly.

mod session;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use worldforge_core::{ChangeAction, Event, HeldKeys, SimulationConfig, WorldDescription};
use worldforge_system_reconciliation::{compute_diff, Config as ReconciliationConfig};
use worldforge_world::query;

use session::Session;

/// Headless driver for the world synchronization and player simulation core.
#[derive(Debug, Parser)]
#[command(name = "worldforge", version)]
struct Cli {
    /// TOML tuning file; every table is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Runs the tick loop against a world description and optional updates.
    Simulate(SimulateArgs),
    /// Prints the per-category changes between two world descriptions.
    Diff {
        /// Previously applied description.
        old: PathBuf,
        /// Incoming description.
        new: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct SimulateArgs {
    /// Initial world description (JSON).
    #[arg(long)]
    world: PathBuf,
    /// Later descriptions, applied in order between ticks.
    #[arg(long)]
    update: Vec<PathBuf>,
    /// Ticks between consecutive updates.
    #[arg(long, default_value_t = 60)]
    update_interval: u32,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 120)]
    ticks: u32,
    /// Fixed step length in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
    /// Keys held for the whole run.
    #[arg(long, value_enum)]
    hold: Vec<Key>,
    /// Ticks at which jump is pressed.
    #[arg(long)]
    jump_at: Vec<u32>,
    /// Ticks at which dash is pressed.
    #[arg(long)]
    dash_at: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Key {
    Forward,
    Backward,
    Left,
    Right,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
}

/// Entry point for the Worldforge command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Simulate(args) => simulate(config, &args),
        Commands::Diff { old, new } => diff(config, &old, &new),
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config toml at {}", path.display()))
}

fn read_payload(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read world description at {}", path.display()))
}

fn simulate(config: SimulationConfig, args: &SimulateArgs) -> Result<()> {
    let mut session = Session::new(config);
    let outcome = session
        .deliver(&read_payload(&args.world)?)
        .with_context(|| format!("rejected world description {}", args.world.display()))?;
    info!("initial world: {outcome:?}");

    let held = held_keys(&args.hold);
    let dt = Duration::from_millis(args.dt_ms);
    let interval = args.update_interval.max(1);
    let mut updates = args.update.iter();
    let mut defeated = 0;

    for tick in 0..args.ticks {
        if tick > 0 && tick % interval == 0 {
            if let Some(path) = updates.next() {
                apply_update(&mut session, path)?;
            }
        }
        if args.jump_at.contains(&tick) {
            let jump = session.jump();
            info!("tick {tick}: jump {jump:?}");
        }
        if args.dash_at.contains(&tick) {
            let started = session.dash();
            info!("tick {tick}: dash started {started}");
        }
        defeated += session
            .tick(dt, held)
            .iter()
            .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
            .count();
    }
    for path in updates {
        apply_update(&mut session, path)?;
    }

    info!(
        "simulated {} ticks, {defeated} enemies defeated, {} entities rendered",
        args.ticks,
        query::render_frame(session.world()).entities.len()
    );
    let summary = serde_json::to_string_pretty(&session.snapshot())
        .context("failed to serialise session summary")?;
    println!("{summary}");
    Ok(())
}

fn apply_update(session: &mut Session, path: &Path) -> Result<()> {
    let payload = read_payload(path)?;
    match session.deliver(&payload) {
        Ok(outcome) => info!("applied update {}: {outcome:?}", path.display()),
        Err(error) => warn!("ignoring update {}: {error}", path.display()),
    }
    Ok(())
}

fn diff(config: SimulationConfig, old: &Path, new: &Path) -> Result<()> {
    let parse = |path: &Path| -> Result<WorldDescription> {
        WorldDescription::from_json(&read_payload(path)?)
            .with_context(|| format!("rejected world description {}", path.display()))
    };
    let (old, new) = (parse(old)?, parse(new)?);
    let patch = compute_diff(
        Some(&old),
        &new,
        &ReconciliationConfig::new(config.world, config.placement),
    );

    if patch.is_empty() {
        println!("no changes");
        return Ok(());
    }
    if let Some(terrain) = &patch.terrain {
        println!("terrain: replaced ({} rows)", terrain.heightmap.len());
    }
    if patch.environment.is_some() {
        println!("environment: updated");
    }
    if let Some(spawn) = patch.spawn_point {
        println!("spawn point: ({}, {})", spawn.x, spawn.y);
    }
    for change in &patch.changes {
        let summary = match &change.action {
            ChangeAction::ReplaceAll { spawns } => format!("replace all with {}", spawns.len()),
            ChangeAction::Grow { spawns } => format!("add {}", spawns.len()),
            ChangeAction::Shrink { count, .. } => format!("remove {count}"),
        };
        println!("{}: {summary}", change.population.label());
    }
    Ok(())
}

fn held_keys(keys: &[Key]) -> HeldKeys {
    let mut held = HeldKeys::default();
    for key in keys {
        let flag = match key {
            Key::Forward => &mut held.forward,
            Key::Backward => &mut held.backward,
            Key::Left => &mut held.left,
            Key::Right => &mut held.right,
            Key::LookLeft => &mut held.look_left,
            Key::LookRight => &mut held.look_right,
            Key::LookUp => &mut held.look_up,
            Key::LookDown => &mut held.look_down,
        };
        *flag = true;
    }
    held
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_arguments_parse() {
        let cli = Cli::try_parse_from([
            "worldforge",
            "simulate",
            "--world",
            "demos/village.json",
            "--hold",
            "forward",
            "--hold",
            "look-right",
            "--dash-at",
            "10",
        ])
        .expect("arguments parse");

        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.ticks, 120);
        assert_eq!(args.dash_at, vec![10]);
        let held = held_keys(&args.hold);
        assert!(held.forward && held.look_right);
        assert!(!held.backward);
    }

    #[test]
    fn demo_files_load_and_reconcile() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let config = load_config(Some(&demos.join("worldforge.toml"))).expect("demo config loads");
        assert_eq!(config.world.scatter_seed, 7);
        assert_eq!(config.camera.distance, 14.0);

        let mut session = Session::new(config);
        let village = read_payload(&demos.join("village.json")).expect("demo world reads");
        let _ = session.deliver(&village).expect("demo world parses");
        apply_update(&mut session, &demos.join("village_grown.json")).expect("demo update reads");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.populations["trees"], 3);
        assert_eq!(snapshot.populations["igloos"], 1);
        assert_eq!(snapshot.live_enemies, 1, "newest enemy removed");
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        assert_eq!(
            load_config(None).expect("defaults load"),
            SimulationConfig::default()
        );
    }
}
