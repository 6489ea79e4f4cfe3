pub mod config;
pub mod simulate;

use std::path::Path;

use optstop_core::SimulationConfig;

/// Values given on the command line. Each one replaces the file/default value.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigOverrides<'a> {
    pub alpha: Option<f64>,
    pub trials: Option<usize>,
    pub start_n: Option<usize>,
    pub max_n: Option<usize>,
    pub rho: Option<&'a str>,
    pub thresholds: Option<&'a str>,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
}

/// Layer defaults, an optional config file, and command-line overrides.
pub fn build_config(
    config_path: Option<&str>,
    overrides: &ConfigOverrides<'_>,
) -> Result<SimulationConfig, String> {
    let mut config = match config_path {
        Some(path) => SimulationConfig::from_json_path(Path::new(path))
            .map_err(|e| format!("failed to load config {path}: {e}"))?,
        None => SimulationConfig::default(),
    };

    if let Some(alpha) = overrides.alpha {
        config.significance_level = alpha;
    }
    if let Some(trials) = overrides.trials {
        config.trials_per_rho = trials;
    }
    if let Some(start_n) = overrides.start_n {
        config.start_sample_size = start_n;
    }
    if let Some(max_n) = overrides.max_n {
        config.max_sample_size = max_n;
    }
    if let Some(list) = overrides.rho {
        config.rho_grid = parse_list(list)?;
    }
    if let Some(list) = overrides.thresholds {
        config.non_significance_thresholds = parse_thresholds(list)?;
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }
    if overrides.workers.is_some() {
        config.workers = overrides.workers;
    }
    Ok(config)
}

/// Parse a comma-separated list of reals.
pub fn parse_list(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| format!("invalid number '{part}' in list '{s}'"))
        })
        .collect()
}

/// Parse exactly three comma-separated thresholds.
pub fn parse_thresholds(s: &str) -> Result<[f64; 3], String> {
    let values = parse_list(s)?;
    <[f64; 3]>::try_from(values.as_slice())
        .map_err(|_| format!("expected 3 thresholds, got {} in '{s}'", values.len()))
}
