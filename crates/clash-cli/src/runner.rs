//! Headless duel execution and reporting.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clash_core::{ActorId, Catalog, CombatConfig, Simulation};
use glam::Vec2;
use serde::Serialize;
use tracing::{info, Level};

use crate::cli::Args;
use crate::duel::{DuelSetup, FighterSetup};

/// Installs the fmt subscriber; `-v` raises the level.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Result of one fighter after the match.
#[derive(Debug, Clone, Serialize)]
pub struct FighterReport {
    pub name: String,
    pub team: u32,
    pub survived: bool,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub attacks: u32,
    pub hits: u32,
    pub blocks: u32,
    pub dodges: u32,
    pub counters: u32,
    pub longest_combo: u32,
    pub combos_completed: u32,
}

/// Result of the whole match.
#[derive(Debug, Clone, Serialize)]
pub struct DuelReport {
    pub seed: u64,
    pub ticks: u64,
    pub match_time: f32,
    pub winner: Option<u32>,
    pub fighters: Vec<FighterReport>,
}

/// Loads everything, runs the match and prints the summary.
pub fn run(args: &Args) -> Result<()> {
    let setup = build_setup(args)?;
    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => Catalog::standard(),
    };
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CombatConfig::default(),
    };

    let (report, sim) = run_duel(&setup, Arc::new(catalog), config, args.tick_rate)?;

    if let Some(path) = &args.output {
        write_log(path, &sim)?;
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn build_setup(args: &Args) -> Result<DuelSetup> {
    let mut setup = match &args.duel {
        Some(path) => DuelSetup::load(path)?,
        None => DuelSetup::pair(
            FighterSetup::preset("Red", 0, 0.0, args.red.into(), args.difficulty.into()),
            FighterSetup::preset("Blue", 1, 4.0, args.blue.into(), args.difficulty.into()),
        ),
    };
    if let Some(seed) = args.seed {
        setup.seed = seed;
    }
    if let Some(max) = args.max_duration {
        setup.max_duration_secs = max;
    }
    setup.validate()?;
    Ok(setup)
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    Catalog::from_json(&text).with_context(|| format!("invalid catalog {}", path.display()))
}

fn load_config(path: &Path) -> Result<CombatConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    CombatConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Runs a match to completion or to its time limit.
pub fn run_duel(
    setup: &DuelSetup,
    catalog: Arc<Catalog>,
    config: CombatConfig,
    tick_rate: u32,
) -> Result<(DuelReport, Simulation)> {
    anyhow::ensure!(tick_rate > 0, "tick rate must be positive");
    #[allow(clippy::cast_precision_loss)]
    let dt = 1.0 / tick_rate as f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_ticks = (setup.max_duration_secs * tick_rate as f32).ceil() as u64;

    let mut sim = Simulation::new(setup.seed)
        .with_catalog(catalog)
        .with_config(config);
    let ids: Vec<ActorId> = setup
        .fighters
        .iter()
        .map(|f| {
            let [x, y] = f.position;
            sim.spawn_ai(&f.name, f.team, Vec2::new(x, y), f.resolve_profile())
        })
        .collect();

    info!(seed = setup.seed, fighters = ids.len(), max_ticks, "match started");
    let outcome = sim.run(dt, max_ticks);

    let fighters = ids
        .iter()
        .filter_map(|&id| sim.arena().get(id))
        .map(|actor| {
            let stats = actor.stats();
            FighterReport {
                name: actor.name().to_string(),
                team: actor.team(),
                survived: actor.is_alive(),
                final_health: actor.health().current(),
                damage_dealt: stats.damage_dealt,
                damage_taken: stats.health.damage_taken,
                attacks: stats.attacks.performed,
                hits: stats.attacks.hits_landed,
                blocks: stats.defense.blocks,
                dodges: stats.defense.dodges,
                counters: stats.defense.counters,
                longest_combo: stats.combos.longest,
                combos_completed: stats.combos.completed,
            }
        })
        .collect();

    let report = DuelReport {
        seed: setup.seed,
        ticks: outcome.ticks,
        match_time: outcome.time,
        winner: outcome.winner,
        fighters,
    };
    Ok((report, sim))
}

fn write_log(path: &Path, sim: &Simulation) -> Result<()> {
    let json = serde_json::to_string_pretty(sim.events().events())?;
    std::fs::write(path, json).with_context(|| format!("failed to write event log {}", path.display()))?;
    info!(path = %path.display(), events = sim.events().len(), "event log written");
    Ok(())
}

fn print_summary(report: &DuelReport) {
    match report.winner {
        Some(team) => println!("Team {team} wins after {:.2}s ({} ticks)", report.match_time, report.ticks),
        None => println!("Draw after {:.2}s ({} ticks)", report.match_time, report.ticks),
    }
    for f in &report.fighters {
        let status = if f.survived { "alive" } else { "down" };
        println!(
            "  {:<10} team {} {:>5} hp {:>6.1}  dealt {:>6.1}  attacks {:>3}  hits {:>3}  blocks {:>3}  dodges {:>3}  best combo {:>2}",
            f.name, f.team, status, f.final_health, f.damage_dealt, f.attacks, f.hits, f.blocks, f.dodges, f.longest_combo
        );
    }
}
