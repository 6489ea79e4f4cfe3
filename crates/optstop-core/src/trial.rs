//! One simulated experiment.
//!
//! A trial grows its analysed prefix one observation at a time, re-tests the
//! correlation at every size, and records the first point at which each
//! stopping criterion fires. It ends once all four have fired.

use log::trace;
use optstop_stats::{CorrelationTest, pearson_test};
use rand::Rng;

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::sample::BivariateSample;
use crate::stopping::{CriterionState, StoppingRules};
use crate::table::ResultRecord;

/// Outcome of a single step: the prefix size tested, the test, and the
/// records of every criterion that fired for the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStep {
    pub n: usize,
    pub test: CorrelationTest,
    pub fired: Vec<ResultRecord>,
}

/// Sequential-testing state machine over one fixed sample.
#[derive(Debug, Clone)]
pub struct Trial {
    sample: BivariateSample,
    rules: StoppingRules,
    n: usize,
    state: CriterionState,
}

impl Trial {
    /// Start a trial at `start_n`. The sample must hold at least
    /// `rules.max_n` pairs.
    pub fn new(sample: BivariateSample, start_n: usize, rules: StoppingRules) -> Self {
        debug_assert!(sample.len() >= rules.max_n);
        debug_assert!(start_n <= rules.max_n);
        Self {
            sample,
            rules,
            n: start_n,
            state: CriterionState::new(),
        }
    }

    /// Prefix size the next step will test.
    pub fn current_n(&self) -> usize {
        self.n
    }

    pub fn is_complete(&self) -> bool {
        self.state.all_satisfied()
    }

    /// Correlation test on the current prefix. A zero-variance prefix counts
    /// as non-significant (r = 0, p = 1).
    pub fn test_prefix(&self) -> CorrelationTest {
        let (x, y) = self.sample.prefix(self.n);
        match pearson_test(x, y) {
            Ok(test) => test,
            Err(err) => {
                trace!("n={}: {err}; treating as non-significant", self.n);
                CorrelationTest::non_significant(self.n)
            }
        }
    }

    /// Test the current prefix, fire every pending criterion whose predicate
    /// holds, then advance n by one (capped at the maximum).
    pub fn step(&mut self) -> TrialStep {
        let n = self.n;
        let test = self.test_prefix();
        let mut fired = Vec::new();
        let before = self.state;
        for criterion in before.pending() {
            if self.rules.fires(criterion, test.p_value, n) && self.state.mark(criterion) {
                fired.push(ResultRecord {
                    rho: self.sample.rho(),
                    category: criterion,
                    n,
                    r: test.r,
                    p: test.p_value,
                });
            }
        }
        if self.n < self.rules.max_n {
            self.n += 1;
        }
        TrialStep { n, test, fired }
    }

    /// Step until every criterion has fired, passing each record to `emit`.
    /// Returns the number of steps taken.
    pub fn run<F>(mut self, emit: &mut F) -> usize
    where
        F: FnMut(ResultRecord),
    {
        let mut steps = 0;
        while !self.is_complete() {
            let step = self.step();
            steps += 1;
            for record in step.fired {
                emit(record);
            }
        }
        steps
    }
}

/// Draw a fresh sample for `rho` and run one trial to completion.
pub fn run_trial<R, F>(
    rho: f64,
    config: &SimulationConfig,
    rng: &mut R,
    emit: &mut F,
) -> Result<usize, SimulationError>
where
    R: Rng + ?Sized,
    F: FnMut(ResultRecord),
{
    let sample = BivariateSample::draw(rho, config.max_sample_size, rng)?;
    let trial = Trial::new(
        sample,
        config.start_sample_size,
        StoppingRules::from_config(config),
    );
    Ok(trial.run(emit))
}
