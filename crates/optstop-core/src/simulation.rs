//! Simulation orchestrator.
//!
//! Architecture:
//! 1. Validate the configuration and resolve the master seed
//! 2. Fan out one unit of work per ρ over a pool of scoped worker threads
//! 3. Each worker runs `trials_per_rho` independent trials with its own RNG
//! 4. Join all workers, then concatenate the per-ρ tables
//!
//! Workers share no mutable state beyond the work-queue cursor. Each ρ's RNG
//! is derived from the master seed and the ρ's grid index, so results do not
//! depend on which worker picks up which ρ.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{SimulationConfig, validate_rho};
use crate::error::SimulationError;
use crate::stopping::StoppingCriterion;
use crate::table::{ResultTable, RhoTable};
use crate::trial::run_trial;

/// Completion signal for one ρ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhoProgress {
    pub rho: f64,
    /// Position of this ρ in the configured grid.
    pub index: usize,
    /// Records produced for this ρ.
    pub rows: usize,
    /// ρ values finished so far, including this one.
    pub completed: usize,
    pub total: usize,
}

type RhoOutcome = Result<RhoTable, SimulationError>;

/// A validated, seeded simulation run.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    seed: u64,
}

impl Simulation {
    /// Validate `config` and fix the master seed. Fails before any sampling.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self { config, seed })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Master seed; pass it back as `config.seed` to reproduce the run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed used for the ρ at grid position `index`.
    pub fn rho_seed(&self, index: usize) -> u64 {
        derive_seed(self.seed, index as u64)
    }

    /// Run every trial for one ρ on a single thread with an explicit seed.
    pub fn simulate_rho(&self, rho: f64, seed: u64) -> Result<RhoTable, SimulationError> {
        validate_rho(rho)?;
        let trials = self.config.trials_per_rho;
        let capacity = trials.saturating_mul(StoppingCriterion::ALL.len());
        let mut table = RhoTable::with_capacity(rho, capacity);
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..trials {
            run_trial(rho, &self.config, &mut rng, &mut |record| table.push(record))?;
        }
        Ok(table)
    }

    /// Run the whole grid, logging each ρ as it completes.
    pub fn run(&self) -> Result<ResultTable, SimulationError> {
        self.run_with_progress(|_| {})
    }

    /// Run the whole grid, calling `on_done` once per finished ρ.
    ///
    /// Any ρ that fails leaves the grid incomplete, and the run as a whole
    /// fails with [`SimulationError::IncompleteGrid`].
    pub fn run_with_progress<F>(&self, on_done: F) -> Result<ResultTable, SimulationError>
    where
        F: Fn(RhoProgress) + Sync,
    {
        self.run_grid(on_done, |rho, seed| self.simulate_rho(rho, seed))
    }

    /// Fan `unit` out over the grid and assemble the per-ρ tables in grid
    /// order.
    fn run_grid<F, U>(&self, on_done: F, unit: U) -> Result<ResultTable, SimulationError>
    where
        F: Fn(RhoProgress) + Sync,
        U: Fn(f64, u64) -> Result<RhoTable, SimulationError> + Sync,
    {
        let grid = &self.config.rho_grid;
        let total = grid.len();
        let workers = self.config.worker_count();
        info!(
            "simulating {} rho values x {} trials (n {}..={}, alpha {}) on {workers} workers, seed {}",
            total,
            self.config.trials_per_rho,
            self.config.start_sample_size,
            self.config.max_sample_size,
            self.config.significance_level,
            self.seed
        );

        let t0 = Instant::now();
        let next = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);

        let joined: Vec<std::thread::Result<Vec<(usize, RhoOutcome)>>> =
            std::thread::scope(|s| {
                let handles: Vec<_> = (0..workers)
                    .map(|worker| {
                        let next = &next;
                        let completed = &completed;
                        let on_done = &on_done;
                        let unit = &unit;
                        s.spawn(move || self.work(worker, next, completed, on_done, unit))
                    })
                    .collect();
                handles.into_iter().map(|h| h.join()).collect()
            });

        let mut slots: Vec<Option<RhoTable>> = vec![None; total];
        let mut failed: Vec<(usize, SimulationError)> = Vec::new();
        for outcome in joined {
            match outcome {
                Ok(results) => {
                    for (index, result) in results {
                        match result {
                            Ok(table) => slots[index] = Some(table),
                            Err(err) => failed.push((index, err)),
                        }
                    }
                }
                Err(_) => warn!("a simulation worker panicked; its results are discarded"),
            }
        }

        let missing: Vec<f64> = slots
            .iter()
            .zip(grid)
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, &rho)| rho)
            .collect();
        if !missing.is_empty() {
            failed.sort_by_key(|(index, _)| *index);
            return Err(SimulationError::IncompleteGrid {
                missing,
                failures: failed.into_iter().map(|(_, err)| err).collect(),
            });
        }

        let table = ResultTable::concat(slots.into_iter().flatten());
        info!(
            "simulation finished: {} rows in {:.2}s",
            table.len(),
            t0.elapsed().as_secs_f64()
        );
        Ok(table)
    }

    /// Worker loop: claim grid indices until the queue is drained.
    fn work<F, U>(
        &self,
        worker: usize,
        next: &AtomicUsize,
        completed: &AtomicUsize,
        on_done: &F,
        unit: &U,
    ) -> Vec<(usize, RhoOutcome)>
    where
        F: Fn(RhoProgress) + Sync,
        U: Fn(f64, u64) -> Result<RhoTable, SimulationError> + Sync,
    {
        let grid = &self.config.rho_grid;
        let mut out = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(&rho) = grid.get(index) else {
                break;
            };
            debug!("worker {worker}: rho={rho} (index {index})");
            let seed = self.rho_seed(index);
            let result = match catch_unwind(AssertUnwindSafe(|| unit(rho, seed))) {
                Ok(result) => result,
                Err(_) => Err(SimulationError::WorkerFailed { rho }),
            };
            match &result {
                Ok(table) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    info!("rho={rho:.2} finished ({done}/{})", grid.len());
                    on_done(RhoProgress {
                        rho,
                        index,
                        rows: table.records.len(),
                        completed: done,
                        total: grid.len(),
                    });
                }
                Err(err) => warn!("{err}"),
            }
            out.push((index, result));
        }
        out
    }
}

/// Validate, run and aggregate in one call.
pub fn simulate(config: SimulationConfig) -> Result<ResultTable, SimulationError> {
    Simulation::new(config)?.run()
}

/// SplitMix64 finalizer over `master + index`, giving well-separated
/// per-stream seeds.
fn derive_seed(master: u64, index: u64) -> u64 {
    let mut z = master.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            trials_per_rho: 40,
            max_sample_size: 30,
            rho_grid: vec![0.0, 0.3, 0.6],
            seed: Some(1234),
            workers: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_seed_distinct() {
        let seeds: Vec<u64> = (0..100).map(|i| derive_seed(42, i)).collect();
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(derive_seed(42, 3), derive_seed(42, 3));
        assert_ne!(derive_seed(42, 3), derive_seed(43, 3));
    }

    #[test]
    fn test_run_produces_full_grid() {
        let sim = Simulation::new(small_config()).unwrap();
        let table = sim.run().unwrap();
        assert_eq!(table.len(), sim.config().expected_rows());
        for rho in [0.0, 0.3, 0.6] {
            for c in StoppingCriterion::ALL {
                assert_eq!(table.group(c, rho).count(), 40);
            }
        }
    }

    #[test]
    fn test_run_is_independent_of_worker_count() {
        let one = Simulation::new(SimulationConfig {
            workers: Some(1),
            ..small_config()
        })
        .unwrap()
        .run()
        .unwrap();
        let three = Simulation::new(SimulationConfig {
            workers: Some(3),
            ..small_config()
        })
        .unwrap()
        .run()
        .unwrap();
        assert_eq!(one, three);
    }

    #[test]
    fn test_progress_called_once_per_rho() {
        let sim = Simulation::new(small_config()).unwrap();
        let seen = Mutex::new(Vec::new());
        sim.run_with_progress(|p| seen.lock().unwrap().push(p)).unwrap();
        let mut seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        seen.sort_by_key(|p| p.index);
        assert_eq!(seen.iter().map(|p| p.rho).collect::<Vec<_>>(), vec![0.0, 0.3, 0.6]);
        assert!(seen.iter().all(|p| p.rows == 160 && p.total == 3));
        let mut completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
        completed.sort_unstable();
        assert_eq!(completed, vec![1, 2, 3]);
    }

    #[test]
    fn test_simulate_rho_reproducible() {
        let sim = Simulation::new(small_config()).unwrap();
        let a = sim.simulate_rho(0.3, 77).unwrap();
        let b = sim.simulate_rho(0.3, 77).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.records.len(), 160);
        assert!(a.records.iter().all(|r| r.rho == 0.3));
    }

    #[test]
    fn test_run_matches_simulate_rho_with_derived_seed() {
        let sim = Simulation::new(small_config()).unwrap();
        let table = sim.run().unwrap();
        let direct = sim.simulate_rho(0.6, sim.rho_seed(2)).unwrap();
        let from_run: Vec<_> = table.iter().filter(|r| r.rho == 0.6).copied().collect();
        assert_eq!(from_run, direct.records);
    }

    #[test]
    fn test_unseeded_run_resolves_seed() {
        let sim = Simulation::new(SimulationConfig {
            seed: None,
            ..small_config()
        })
        .unwrap();
        let replay = Simulation::new(SimulationConfig {
            seed: Some(sim.seed()),
            ..small_config()
        })
        .unwrap();
        assert_eq!(sim.run().unwrap(), replay.run().unwrap());
    }

    #[test]
    fn test_invalid_config_fails_before_sampling() {
        let err = Simulation::new(SimulationConfig {
            rho_grid: vec![0.0, 1.5],
            ..small_config()
        })
        .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter { name: "rho", .. }));
    }

    #[test]
    fn test_panicking_rho_fails_whole_run() {
        let sim = Simulation::new(small_config()).unwrap();
        let finished = Mutex::new(Vec::new());
        let err = sim
            .run_grid(
                |p| finished.lock().unwrap().push(p.rho),
                |rho, seed| {
                    if rho == 0.3 {
                        panic!("injected failure");
                    }
                    sim.simulate_rho(rho, seed)
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::IncompleteGrid {
                missing: vec![0.3],
                failures: vec![SimulationError::WorkerFailed { rho: 0.3 }],
            }
        );
        let mut finished = finished.into_inner().unwrap();
        finished.sort_by(f64::total_cmp);
        assert_eq!(finished, vec![0.0, 0.6]);
    }

    #[test]
    fn test_failed_rho_error_is_reported() {
        let sim = Simulation::new(small_config()).unwrap();
        let err = sim
            .run_grid(
                |_| {},
                |rho, seed| {
                    if rho == 0.6 {
                        return Err(SimulationError::invalid("rho", "rejected"));
                    }
                    sim.simulate_rho(rho, seed)
                },
            )
            .unwrap_err();
        match err {
            SimulationError::IncompleteGrid { missing, failures } => {
                assert_eq!(missing, vec![0.6]);
                assert!(matches!(
                    failures.as_slice(),
                    [SimulationError::InvalidParameter { name: "rho", .. }]
                ));
            }
            other => panic!("expected IncompleteGrid, got {other:?}"),
        }
    }

    #[test]
    fn test_simulate_rho_rejects_invalid_rho() {
        let sim = Simulation::new(small_config()).unwrap();
        assert!(sim.simulate_rho(-2.0, 1).is_err());
    }
}
