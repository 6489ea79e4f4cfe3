//! CLI for optstop: how much does peeking at your data inflate false positives?

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "optstop")]
#[command(about = "optstop: Monte Carlo simulation of optional stopping in correlational studies")]
#[command(version = optstop_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stopping-rule simulation over a grid of true correlations
    /// and print the proportion of significant results per rule.
    Simulate {
        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<String>,

        /// Significance level alpha
        #[arg(long)]
        alpha: Option<f64>,

        /// Trials per rho
        #[arg(long)]
        trials: Option<usize>,

        /// Sample size at the first test
        #[arg(long)]
        start_n: Option<usize>,

        /// Sample size cap (forced stop)
        #[arg(long)]
        max_n: Option<usize>,

        /// Comma-separated rho grid, e.g. "0,0.2,0.5"
        #[arg(long)]
        rho: Option<String>,

        /// Three comma-separated give-up thresholds, e.g. "0.1,0.3,0.5"
        #[arg(long)]
        thresholds: Option<String>,

        /// Master seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (default: available parallelism)
        #[arg(long)]
        workers: Option<usize>,

        /// Print the summary as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Only log warnings and errors
        #[arg(long)]
        quiet: bool,
    },

    /// Print the default configuration as JSON (a starting point for --config)
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            alpha,
            trials,
            start_n,
            max_n,
            rho,
            thresholds,
            seed,
            workers,
            json,
            quiet,
        } => {
            init_logging(quiet);
            commands::simulate::run(commands::simulate::SimulateCommandConfig {
                config_path: config.as_deref(),
                overrides: commands::ConfigOverrides {
                    alpha,
                    trials,
                    start_n,
                    max_n,
                    rho: rho.as_deref(),
                    thresholds: thresholds.as_deref(),
                    seed,
                    workers,
                },
                json,
            })
        }
        Commands::Config => commands::config::run(),
    }
}

/// Install the logger. `RUST_LOG` takes precedence over the default level.
fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
