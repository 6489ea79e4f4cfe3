//! # optstop-core
//!
//! **How much does peeking at your data inflate false positives?**
//!
//! `optstop-core` is a Monte Carlo engine for optional stopping in
//! correlational studies. For each true population correlation ρ it simulates
//! many experiments in which a researcher grows the sample one observation at a
//! time, re-tests the correlation after every addition, and stops under one of
//! four rules.
//!
//! ## Quick Start
//!
//! ```no_run
//! use optstop_core::{SimulationConfig, Simulation, StoppingCriterion};
//!
//! let config = SimulationConfig {
//!     rho_grid: vec![0.0],
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let table = Simulation::new(config).unwrap().run().unwrap();
//!
//! // Fraction of "published" results that were significant under the null.
//! let rows: Vec<_> = table.group(StoppingCriterion::SignificantOnly, 0.0).collect();
//! let significant = rows.iter().filter(|r| r.p < 0.05).count();
//! println!("false-positive rate: {:.3}", significant as f64 / rows.len() as f64);
//! ```
//!
//! ## Architecture
//!
//! Simulation(ρ) → Trial × N → (Sample once, then Test + Evaluate per n) → Records → Table
//!
//! - [`BivariateSample`] draws one fixed batch of correlated pairs per trial.
//! - [`Trial`] re-tests every prefix from the start size up to the cap and
//!   records where each [`StoppingCriterion`] first fires.
//! - [`Simulation`] runs one ρ per worker thread and concatenates the per-ρ
//!   [`RhoTable`]s into a [`ResultTable`].

pub mod config;
pub mod error;
pub mod sample;
pub mod simulation;
pub mod stopping;
pub mod table;
pub mod trial;

pub use config::{
    DEFAULT_MAX_SAMPLE_SIZE, DEFAULT_NON_SIGNIFICANCE_THRESHOLDS, DEFAULT_SIGNIFICANCE_LEVEL,
    DEFAULT_START_SAMPLE_SIZE, DEFAULT_TRIALS_PER_RHO, SimulationConfig, default_rho_grid,
};
pub use error::SimulationError;
pub use optstop_stats::{CorrelationError, CorrelationTest};
pub use sample::BivariateSample;
pub use simulation::{RhoProgress, Simulation, simulate};
pub use stopping::{CriterionState, StoppingCriterion, StoppingRules, criterion_fires};
pub use table::{ResultRecord, ResultTable, RhoTable};
pub use trial::{Trial, TrialStep, run_trial};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
