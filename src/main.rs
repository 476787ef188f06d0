use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rboids::engine::{Engine, SCENARIO_CALM, SCENARIO_FROM_CONFIG, scenario_catalog};
use rboids::{ExecutionMode, SimConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rboids", version, about = "Run a headless predator/prey flock")]
struct Cli {
    /// Built-in scenario id, or `from-config`.
    #[arg(long, default_value = SCENARIO_CALM)]
    scenario: String,

    /// JSON configuration file; implies `--scenario from-config`.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Frame time step in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Override the configured boid count.
    #[arg(long)]
    boids: Option<usize>,

    /// Override the configured predator count.
    #[arg(long)]
    predators: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Compute frames on the calling thread only.
    #[arg(long)]
    sequential: bool,

    /// Log population counts every N frames (0 disables).
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// List the built-in scenarios and exit.
    #[arg(long)]
    list_scenarios: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.list_scenarios {
        for s in scenario_catalog() {
            println!("{:<14} {}", s.id, s.description);
        }
        return Ok(());
    }
    if !(cli.dt.is_finite() && cli.dt > 0.0) {
        bail!("--dt must be a positive number of seconds");
    }

    let mut engine = build_engine(&cli)?;
    if cli.sequential {
        engine.set_execution_mode(ExecutionMode::Sequential);
    }
    info!(
        scenario = engine.scenario_id(),
        boids = engine.boid_count(),
        predators = engine.predator_count(),
        mode = ?engine.scheduler().mode(),
        "starting run"
    );

    let started = Instant::now();
    let mut killed = 0usize;
    for _ in 0..cli.frames {
        let report = engine.tick(cli.dt)?;
        killed += report.killed.len();
        if cli.report_every > 0 && (report.frame + 1) % cli.report_every == 0 {
            info!(
                frame = report.frame + 1,
                boids = report.boids,
                predators = report.predators,
                killed,
                "progress"
            );
        }
    }
    let elapsed = started.elapsed();

    println!("scenario   {}", engine.scenario_id());
    println!("frames     {}", engine.frame());
    println!("boids      {}", engine.boid_count());
    println!("predators  {}", engine.predator_count());
    println!("killed     {}", killed);
    println!(
        "elapsed    {:.3} s ({:.3} ms/frame)",
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / cli.frames.max(1) as f64
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn build_engine(cli: &Cli) -> Result<Engine> {
    let overrides = cli.boids.is_some() || cli.predators.is_some() || cli.seed.is_some();
    if cli.config.is_none() && cli.scenario != SCENARIO_FROM_CONFIG {
        if overrides {
            warn!(
                scenario = %cli.scenario,
                "--boids/--predators/--seed only apply to from-config runs; ignoring"
            );
        }
        return Engine::new_builtin(&cli.scenario)
            .with_context(|| format!("building scenario '{}'", cli.scenario));
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(boids) = cli.boids {
        config.population.boids = boids;
    }
    if let Some(predators) = cli.predators {
        config.population.predators = predators;
    }
    if let Some(seed) = cli.seed {
        config.population.seed = seed;
    }
    Engine::from_config(&config).context("building engine from config")
}
