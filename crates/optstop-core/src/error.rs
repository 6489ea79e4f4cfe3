//! Error taxonomy for simulation runs.

/// Failure of a simulation run.
///
/// Configuration problems are reported before any sampling starts. A run
/// whose grid is not fully covered fails as a whole with `IncompleteGrid`,
/// which carries the per-ρ errors that caused it.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A configuration value lies outside its valid domain.
    InvalidParameter { name: &'static str, reason: String },
    /// The worker simulating this ρ panicked. Surfaces inside
    /// `IncompleteGrid::failures`.
    WorkerFailed { rho: f64 },
    /// The aggregated table lacks these ρ values. `failures` holds the error
    /// of each ρ that failed, in grid order.
    IncompleteGrid {
        missing: Vec<f64>,
        failures: Vec<SimulationError>,
    },
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            Self::WorkerFailed { rho } => write!(f, "worker for rho={rho} failed"),
            Self::IncompleteGrid { missing, failures } => {
                let list: Vec<String> = missing.iter().map(|r| format!("{r}")).collect();
                write!(f, "simulation incomplete: no results for rho [{}]", list.join(", "))?;
                for failure in failures {
                    write!(f, "; {failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_parameter() {
        let err = SimulationError::invalid("start_sample_size", "must be at least 3, got 2");
        assert_eq!(
            err.to_string(),
            "invalid parameter `start_sample_size`: must be at least 3, got 2"
        );
    }

    #[test]
    fn test_display_incomplete_grid() {
        let err = SimulationError::IncompleteGrid {
            missing: vec![0.1, 0.5],
            failures: vec![SimulationError::WorkerFailed { rho: 0.5 }],
        };
        assert_eq!(
            err.to_string(),
            "simulation incomplete: no results for rho [0.1, 0.5]; worker for rho=0.5 failed"
        );
    }
}
