//! Stopping criteria: when a simulated researcher stops collecting data.
//!
//! Four independent rules, each a pure predicate over the current p-value and
//! sample size. Every rule also fires unconditionally once the sample reaches
//! its cap, so no trial can run forever.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// One of the four publication/stopping policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoppingCriterion {
    /// Stop only on p < α.
    SignificantOnly,
    /// Stop on p < α, or give up once p > the low threshold (default 0.1).
    SignificantOrLowP,
    /// Stop on p < α, or give up once p > the medium threshold (default 0.3).
    SignificantOrMedP,
    /// Stop on p < α, or give up once p > the high threshold (default 0.5).
    SignificantOrHighP,
}

impl StoppingCriterion {
    pub const ALL: [Self; 4] = [
        Self::SignificantOnly,
        Self::SignificantOrLowP,
        Self::SignificantOrMedP,
        Self::SignificantOrHighP,
    ];

    /// Position in [`Self::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::SignificantOnly => 0,
            Self::SignificantOrLowP => 1,
            Self::SignificantOrMedP => 2,
            Self::SignificantOrHighP => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SignificantOnly => "SignificantOnly",
            Self::SignificantOrLowP => "SignificantOrLowP",
            Self::SignificantOrMedP => "SignificantOrMedP",
            Self::SignificantOrHighP => "SignificantOrHighP",
        }
    }

    /// The non-significance threshold this criterion gives up above, if any.
    pub fn give_up_threshold(self, thresholds: &[f64; 3]) -> Option<f64> {
        match self {
            Self::SignificantOnly => None,
            Self::SignificantOrLowP => Some(thresholds[0]),
            Self::SignificantOrMedP => Some(thresholds[1]),
            Self::SignificantOrHighP => Some(thresholds[2]),
        }
    }
}

impl std::fmt::Display for StoppingCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `criterion` fires for p-value `p` at sample size `n`.
///
/// A NaN p-value never satisfies the p-based clauses; only the forced stop
/// at `max_n` applies.
pub fn criterion_fires(
    criterion: StoppingCriterion,
    p: f64,
    n: usize,
    max_n: usize,
    alpha: f64,
    thresholds: &[f64; 3],
) -> bool {
    if n >= max_n {
        return true;
    }
    if p < alpha {
        return true;
    }
    match criterion.give_up_threshold(thresholds) {
        Some(threshold) => p > threshold,
        None => false,
    }
}

/// The constants every criterion is evaluated against, taken from a config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingRules {
    pub alpha: f64,
    pub thresholds: [f64; 3],
    pub max_n: usize,
}

impl StoppingRules {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            alpha: config.significance_level,
            thresholds: config.non_significance_thresholds,
            max_n: config.max_sample_size,
        }
    }

    pub fn fires(&self, criterion: StoppingCriterion, p: f64, n: usize) -> bool {
        criterion_fires(criterion, p, n, self.max_n, self.alpha, &self.thresholds)
    }
}

/// Per-trial record of which criteria have already fired.
///
/// A bit is set at most once and never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriterionState {
    satisfied: [bool; 4],
}

impl CriterionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_satisfied(&self, criterion: StoppingCriterion) -> bool {
        self.satisfied[criterion.index()]
    }

    /// Mark `criterion` as fired. Returns `true` only on the false → true
    /// transition.
    pub fn mark(&mut self, criterion: StoppingCriterion) -> bool {
        let slot = &mut self.satisfied[criterion.index()];
        let transitioned = !*slot;
        *slot = true;
        transitioned
    }

    pub fn all_satisfied(&self) -> bool {
        self.satisfied.iter().all(|&s| s)
    }

    pub fn pending(&self) -> impl Iterator<Item = StoppingCriterion> + '_ {
        StoppingCriterion::ALL
            .into_iter()
            .filter(move |c| !self.is_satisfied(*c))
    }
}
