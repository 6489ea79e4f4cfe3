//! Run configuration.
//!
//! A [`SimulationConfig`] is an immutable value threaded from the orchestrator
//! down to every trial. It is validated once, before any sampling starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Default significance level α.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;
/// Default number of trials per ρ.
pub const DEFAULT_TRIALS_PER_RHO: usize = 5000;
/// Default first sample size tested.
pub const DEFAULT_START_SAMPLE_SIZE: usize = 3;
/// Default sample size cap (forced stop).
pub const DEFAULT_MAX_SAMPLE_SIZE: usize = 150;
/// Default non-significance thresholds for the low/med/high criteria.
pub const DEFAULT_NON_SIGNIFICANCE_THRESHOLDS: [f64; 3] = [0.1, 0.3, 0.5];

/// Smallest sample with a defined correlation test.
pub const MIN_START_SAMPLE_SIZE: usize = optstop_stats::MIN_PAIRS;

/// Default ρ grid: 0.0 to 0.9 in steps of 0.1.
pub fn default_rho_grid() -> Vec<f64> {
    (0..10).map(|i| i as f64 / 10.0).collect()
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Significance level α; p < α counts as significant.
    pub significance_level: f64,
    /// Independent trials simulated per ρ.
    pub trials_per_rho: usize,
    /// Sample size at the first test of every trial.
    pub start_sample_size: usize,
    /// Sample size at which every criterion is forced to stop.
    pub max_sample_size: usize,
    /// True population correlations to simulate.
    pub rho_grid: Vec<f64>,
    /// p-value thresholds above which the low/med/high criteria give up.
    pub non_significance_thresholds: [f64; 3],
    /// Master seed. `None` draws one from the OS when the run is created.
    pub seed: Option<u64>,
    /// Worker pool size. `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            trials_per_rho: DEFAULT_TRIALS_PER_RHO,
            start_sample_size: DEFAULT_START_SAMPLE_SIZE,
            max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
            rho_grid: default_rho_grid(),
            non_significance_thresholds: DEFAULT_NON_SIGNIFICANCE_THRESHOLDS,
            seed: None,
            workers: None,
        }
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_json_path(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str::<Self>(&raw).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to parse simulation config JSON: {e}"),
            )
        })
    }

    /// Check every value against its domain.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let alpha = self.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(SimulationError::invalid(
                "significance_level",
                format!("must lie in (0, 1), got {alpha}"),
            ));
        }
        if self.trials_per_rho == 0 {
            return Err(SimulationError::invalid(
                "trials_per_rho",
                "must be at least 1",
            ));
        }
        if self.start_sample_size < MIN_START_SAMPLE_SIZE {
            return Err(SimulationError::invalid(
                "start_sample_size",
                format!(
                    "must be at least {MIN_START_SAMPLE_SIZE}, got {}",
                    self.start_sample_size
                ),
            ));
        }
        if self.start_sample_size > self.max_sample_size {
            return Err(SimulationError::invalid(
                "start_sample_size",
                format!(
                    "must not exceed max_sample_size ({}), got {}",
                    self.max_sample_size, self.start_sample_size
                ),
            ));
        }
        if self.rho_grid.is_empty() {
            return Err(SimulationError::invalid("rho_grid", "must not be empty"));
        }
        for &rho in &self.rho_grid {
            validate_rho(rho)?;
        }
        if self.checked_rows().is_none() {
            return Err(SimulationError::invalid(
                "trials_per_rho",
                format!(
                    "{} trials over {} rho values overflow the result table",
                    self.trials_per_rho,
                    self.rho_grid.len()
                ),
            ));
        }
        for &threshold in &self.non_significance_thresholds {
            if !(threshold > 0.0 && threshold < 1.0) {
                return Err(SimulationError::invalid(
                    "non_significance_thresholds",
                    format!("each threshold must lie in (0, 1), got {threshold}"),
                ));
            }
        }
        if self.workers == Some(0) {
            return Err(SimulationError::invalid("workers", "must be at least 1"));
        }
        Ok(())
    }

    /// Effective worker count: configured or available parallelism, never
    /// more than the grid has ρ values.
    pub fn worker_count(&self) -> usize {
        let requested = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        requested.clamp(1, self.rho_grid.len().max(1))
    }

    /// Total rows a complete run produces.
    pub fn expected_rows(&self) -> usize {
        self.checked_rows().unwrap_or(usize::MAX)
    }

    fn checked_rows(&self) -> Option<usize> {
        self.rho_grid
            .len()
            .checked_mul(self.trials_per_rho)?
            .checked_mul(crate::stopping::StoppingCriterion::ALL.len())
    }
}

/// A population correlation must be finite and inside [-1, 1].
pub fn validate_rho(rho: f64) -> Result<(), SimulationError> {
    if !rho.is_finite() || rho.abs() > 1.0 {
        return Err(SimulationError::invalid(
            "rho",
            format!("must lie in [-1, 1], got {rho}"),
        ));
    }
    Ok(())
}
