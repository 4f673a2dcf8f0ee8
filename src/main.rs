// --- File: main.rs ---
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;

use skyforage::config::SimulationConfig;
use skyforage::region::RegionGrid;
use skyforage::results::{JsonLinesSink, RunSummary};
use skyforage::simulation::Simulation;

const DEFAULT_MAX_STEPS: u64 = 200_000;

#[derive(Parser)]
#[command(name = "skyforage")]
#[command(about = "Headless bird foraging simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation until every bird has arrived or starved
    Run {
        /// JSON config; the stock three-species setup when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Give up after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        steps: u64,
        /// Write per-agent results as JSON lines
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Classified region grid (JSON) bounding the world
        #[arg(long)]
        regions: Option<PathBuf>,
    },
    /// Run independent simulations in parallel with consecutive seeds
    Batch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "8")]
        runs: u64,
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        steps: u64,
    },
    /// Print the stock configuration as JSON
    DumpDefaultConfig,
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(SimulationConfig::new()),
    }
}

fn load_regions(path: &Path) -> Result<RegionGrid> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading region grid {}", path.display()))?;
    let grid: RegionGrid = serde_json::from_str(&text)
        .with_context(|| format!("parsing region grid {}", path.display()))?;
    Ok(grid)
}

/// Steps until the run finalizes or the cap is hit.
fn run_to_completion(sim: &mut Simulation, max_steps: u64) -> Option<RunSummary> {
    while sim.tick() < max_steps {
        if let Some(summary) = sim.update() {
            return Some(summary);
        }
        if sim.is_paused() {
            break;
        }
    }
    None
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Simulation {}: {} ticks, {} arrived, {} starved, {} starved after arriving",
        summary.simulation_id,
        summary.ticks,
        summary.successes,
        summary.deaths,
        summary.starved_after_arrival
    );
    for (species, stats) in &summary.species {
        match stats.mean_success_step {
            Some(mean) => println!(
                "  {:<10} {:>4} arrivals, mean step {:.1}",
                species,
                stats.success_steps.len(),
                mean
            ),
            None => println!("  {:<10}    0 arrivals", species),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            out,
            regions,
        } => {
            let config = load_config(config.as_deref())?;
            let mut sim = match regions {
                Some(path) => Simulation::with_regions(config, load_regions(&path)?)?,
                None => Simulation::new(config)?,
            };

            match run_to_completion(&mut sim, steps) {
                Some(summary) => print_summary(&summary),
                None => println!(
                    "Stopped after {} ticks: {} of {} agents resolved",
                    sim.tick(),
                    sim.successes() + sim.deaths(),
                    sim.total_agents()
                ),
            }

            if let Some(path) = out {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                let mut sink = JsonLinesSink::new(BufWriter::new(file));
                sim.write_results(&mut sink)
                    .with_context(|| format!("writing results to {}", path.display()))?;
                log::info!("Wrote {} result rows to {}", sim.results().len(), path.display());
            }
        }

        Commands::Batch {
            config,
            runs,
            steps,
        } => {
            let base = load_config(config.as_deref())?;
            let first_seed = base.seed.unwrap_or(0);
            // Each run stays single-threaded; runs are spread over the pool.
            let summaries: Vec<(u64, Option<RunSummary>)> = (0..runs)
                .into_par_iter()
                .map(|i| -> Result<(u64, Option<RunSummary>)> {
                    let seed = first_seed.wrapping_add(i);
                    let mut config = base.clone();
                    config.seed = Some(seed);
                    let mut sim = Simulation::new(config)?;
                    Ok((seed, run_to_completion(&mut sim, steps)))
                })
                .collect::<Result<_>>()?;

            for (seed, summary) in &summaries {
                println!("--- seed {} ---", seed);
                match summary {
                    Some(summary) => print_summary(summary),
                    None => println!("  did not finish within {} ticks", steps),
                }
            }
        }

        Commands::DumpDefaultConfig => {
            let json = serde_json::to_string_pretty(&SimulationConfig::new())
                .context("serializing default config")?;
            println!("{}", json);
        }
    }

    Ok(())
}
