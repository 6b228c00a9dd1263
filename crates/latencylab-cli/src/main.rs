mod config;
mod modelio;
mod report;

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use env_logger::{Builder, Env, Target};
use latencylab_core::{aggregate, run_many, CancelSignal, RunOptions};
use log::{error, info};

#[derive(Parser)]
#[command(name = "latencylab")]
#[command(about = "Discrete-event latency simulation for event-driven interactive systems")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of simulations and write trace.csv, runs.csv, and
    /// summary.json to the configured output directory.
    Run {
        /// Path to the run configuration TOML file.
        #[arg(short, long)]
        config: PathBuf,
        /// Path to the model JSON file, overrides the config's `model`.
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Number of runs, overrides the config's `runs`.
        #[arg(short = 'n', long)]
        runs: Option<u64>,
        /// Master seed, overrides the config's `base_seed`.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output directory, overrides the config's `output_dir`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a model JSON file without running it.
    Validate {
        /// Path to the model JSON file.
        model: PathBuf,
    },
}

fn main() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.target(Target::Stdout);
    builder.init();

    if let Err(e) = do_main() {
        error!("error: {e}");
        exit(1);
    }
}

fn do_main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            model,
            runs,
            seed,
            output,
        } => run(config, model, runs, seed, output),
        Commands::Validate { model } => validate(model),
    }
}

fn validate(model_path: PathBuf) -> Result<()> {
    let model = modelio::load_model(&model_path)?;
    info!(
        "model is valid: schema_version={}, {} contexts, {} events, {} tasks, {} wiring edges",
        model.schema_version,
        model.contexts.len(),
        model.events.len(),
        model.tasks.len(),
        model.wiring.len()
    );
    Ok(())
}

fn run(
    config_path: PathBuf,
    model_override: Option<PathBuf>,
    runs_override: Option<u64>,
    seed_override: Option<u64>,
    output_override: Option<PathBuf>,
) -> Result<()> {
    let cfg = Config::from_file(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;

    let model_path = model_override.unwrap_or_else(|| PathBuf::from(&cfg.model));
    let model = modelio::load_model(&model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;

    let n_runs = runs_override.unwrap_or(cfg.runs);
    let base_seed = seed_override.unwrap_or(cfg.base_seed);
    let output_dir = output_override.unwrap_or_else(|| PathBuf::from(&cfg.output_dir));

    info!("running {n_runs} runs (base_seed={base_seed}) on schema_version {}", model.schema_version);

    let opts = RunOptions {
        collect_traces: cfg.collect_traces,
        max_parallelism: cfg.max_parallelism,
        deadline_ms: cfg.deadline_ms,
    };
    let cancel: Option<&dyn CancelSignal> = None;
    let report = run_many(&model, n_runs, base_seed, opts, cancel)?;
    if let Some(reason) = &report.stopped_early {
        error!("batch stopped early: {reason}");
    }

    create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let summary = aggregate(&report.results, Some(&model), cfg.top_k);

    report::write_trace_csv(output_dir.join("trace.csv"), &report.results)?;
    report::write_runs_csv(output_dir.join("runs.csv"), &report.results)?;
    report::write_summary_json(output_dir.join("summary.json"), &summary)?;

    info!("wrote results to {}", output_dir.display());
    Ok(())
}
