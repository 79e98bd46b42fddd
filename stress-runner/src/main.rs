//! stress-runner - replays or generates inputs for the persistent-array stress driver
//!
//! Usage:
//!   cargo run -p stress-runner -- replay <path>...
//!   cargo run -p stress-runner -- generate --seed 7 --runs 1000

mod corpus;
mod generate;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use persistent_array::stress::{RunSummary, StressConfig, run_input};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stress-runner")]
#[command(about = "Drives persistent arrays through byte-encoded operation sequences")]
struct Cli {
    #[command(flatten)]
    driver: DriverArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand
#[derive(Args, Debug)]
struct DriverArgs {
    /// Number of array slots an input can address (1-256)
    #[arg(long, global = true, env = "PERSISTENT_ARRAY_SLOTS", default_value_t = 4)]
    slots: usize,

    /// Pushes onto arrays larger than this are skipped
    #[arg(long, global = true, env = "PERSISTENT_ARRAY_MAX_SIZE", default_value_t = 1 << 10)]
    max_size: usize,

    /// Skip the Vec mirror comparison after each step
    #[arg(long, global = true)]
    no_verify: bool,
}

impl DriverArgs {
    fn config(&self) -> Result<StressConfig> {
        let config = StressConfig::new(self.slots, self.max_size)
            .context("Invalid stress configuration")?;
        Ok(config.with_model_verification(!self.no_verify))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replay input files, or every file inside the given directories
    Replay {
        /// Files or directories to replay
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Generate and run seeded random inputs
    Generate(generate::GenerateArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persistent_array=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.driver.config()?;
    tracing::info!(
        slots = config.slot_count(),
        max_size = config.max_size(),
        verify = config.verify_model(),
        "stress configuration loaded"
    );

    let mut total = Totals::default();
    match cli.command {
        Commands::Replay { inputs } => {
            for (path, bytes) in corpus::load(&inputs)? {
                let summary = run_input(&bytes, &config)
                    .with_context(|| format!("Input {} failed", path.display()))?;
                tracing::debug!(path = %path.display(), steps = summary.steps, "replayed input");
                total.record(&summary);
            }
        }
        Commands::Generate(args) => {
            for (run, bytes) in generate::inputs(&args, config.slot_count()) {
                match run_input(&bytes, &config) {
                    Ok(summary) => total.record(&summary),
                    Err(error) => {
                        let path =
                            corpus::save_failure(&args.failure_dir, args.seed, run, &bytes)?;
                        bail!(
                            "Run {run} (seed {}) failed: {error}; input written to {}",
                            args.seed,
                            path.display()
                        );
                    }
                }
            }
        }
    }

    tracing::info!(
        runs = total.runs,
        steps = total.steps,
        max_size = total.max_size,
        "all runs passed"
    );
    Ok(())
}

#[derive(Debug, Default)]
struct Totals {
    runs: usize,
    steps: usize,
    max_size: usize,
}

impl Totals {
    fn record(&mut self, summary: &RunSummary) {
        self.runs += 1;
        self.steps += summary.steps;
        self.max_size = self.max_size.max(summary.max_size);
    }
}
