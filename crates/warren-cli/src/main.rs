//! Warren CLI - run creature scenarios headless.
//!
//! - `warren run <scenario.yaml>` - simulate and print a summary
//! - `warren actions` - list the action type tokens

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use warren_core::ActionType;
use warren_sim::{Scenario, Simulation, Summary};

#[derive(Parser)]
#[command(name = "warren")]
#[command(about = "Creature action-stack simulator", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Scenario file (yaml)
        scenario: PathBuf,

        /// Ticks to run (defaults to the scenario's `ticks`)
        #[arg(long)]
        ticks: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Record and print the transition trace
        #[arg(long)]
        trace: bool,
    },

    /// List action type tokens
    Actions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            json,
            trace,
        } => run_scenario(&scenario, ticks, json, trace),
        Commands::Actions => {
            list_actions();
            Ok(())
        }
    }
}

fn run_scenario(path: &Path, ticks: Option<u64>, json: bool, trace: bool) -> Result<()> {
    let mut scenario = Scenario::load(path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    if trace {
        scenario.config.trace = true;
    }
    let ticks = ticks.unwrap_or(scenario.config.ticks);

    let mut sim = Simulation::from_scenario(&scenario).context("building simulation")?;
    tracing::info!(
        scenario = %path.display(),
        creatures = sim.agents().len(),
        ticks,
        "starting"
    );
    let changes = sim.run(ticks);
    let summary = sim.summary();

    if json {
        let mut out = serde_json::json!({ "changes": changes, "summary": summary });
        if let Some(log) = sim.trace() {
            out["trace"] = serde_json::to_value(log)?;
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&summary, changes);
        if let Some(log) = sim.trace() {
            println!();
            println!("Trace ({} events):", log.len());
            for event in &log.events {
                println!(
                    "  t={:<5} {:<16} a={} {}",
                    event.tick,
                    event.tag,
                    event.a,
                    event.detail.as_deref().unwrap_or("")
                );
            }
        }
    }

    sim.shutdown();
    Ok(())
}

fn print_summary(summary: &Summary, changes: usize) {
    println!("Tick {} ({} stack changes)", summary.tick, changes);
    println!();
    println!("Creatures:");
    for creature in &summary.creatures {
        let position = creature
            .position
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<4} {:<10} {:<7} {:<10} {}",
            creature.id.to_string(),
            creature.name,
            if creature.worker { "worker" } else { "fighter" },
            position,
            creature.stack.join(" > ")
        );
    }
    println!();
    println!(
        "Tiles: {} dirt, {} marked, {} floor, {} claimed floor, {} claimed wall",
        summary.tiles.dirt,
        summary.tiles.marked,
        summary.tiles.floor,
        summary.tiles.claimed_floor,
        summary.tiles.claimed_wall
    );
    println!("Entities: {}", summary.entities.len());
    for entity in &summary.entities {
        println!(
            "  {:<8} {:<10} hp={} {:?}",
            entity.id, entity.name, entity.hp, entity.location
        );
    }
    println!("Claims held: {}", summary.claims);
    if !summary.player.active.is_empty() {
        println!("Busy workers:");
        for (action, count) in &summary.player.active {
            println!("  {action:<24} {count}");
        }
    }
}

fn list_actions() {
    for kind in ActionType::ALL {
        let requirements = kind.requirements();
        let claim = requirements
            .claim
            .map(|(claim, _)| claim.to_string())
            .unwrap_or_default();
        println!(
            "{:<24} cell={:<5} entity={:<5} {}",
            kind.as_str(),
            requirements.cell,
            requirements.entity,
            claim
        );
    }
}
