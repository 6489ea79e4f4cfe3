use std::time::Instant;

use log::debug;
use optstop_core::{ResultTable, Simulation, StoppingCriterion};
use serde::Serialize;

use super::ConfigOverrides;

pub struct SimulateCommandConfig<'a> {
    pub config_path: Option<&'a str>,
    pub overrides: ConfigOverrides<'a>,
    pub json: bool,
}

/// Per (category, rho) summary of the result table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub category: StoppingCriterion,
    pub rho: f64,
    pub trials: usize,
    pub proportion_significant: f64,
    pub mean_n: f64,
    pub mean_abs_r: f64,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    seed: u64,
    significance_level: f64,
    trials_per_rho: usize,
    rows: &'a [SummaryRow],
}

pub fn run(cmd: SimulateCommandConfig<'_>) {
    let config = match super::build_config(cmd.config_path, &cmd.overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    debug!("effective config: {config:?}");
    let simulation = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let t0 = Instant::now();
    let table = match simulation.run() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Simulation failed: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();

    let config = simulation.config();
    let rows = summarize(&table, config.significance_level);

    if cmd.json {
        let report = SummaryReport {
            seed: simulation.seed(),
            significance_level: config.significance_level,
            trials_per_rho: config.trials_per_rho,
            rows: &rows,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "{} rows from {} rho values x {} trials in {:.1}s (seed {})",
        table.len(),
        config.rho_grid.len(),
        config.trials_per_rho,
        elapsed,
        simulation.seed()
    );
    println!("\n{}", "=".repeat(72));
    println!(
        "{:<20} {:>6} {:>8} {:>10} {:>10} {:>10}",
        "Rule", "rho", "Trials", "P(sig)", "Mean n", "Mean |r|"
    );
    println!("{}", "-".repeat(72));
    for row in &rows {
        println!(
            "{:<20} {:>6.2} {:>8} {:>10.3} {:>10.1} {:>10.3}",
            row.category.name(),
            row.rho,
            row.trials,
            row.proportion_significant,
            row.mean_n,
            row.mean_abs_r
        );
    }
    println!(
        "\nP(sig) is the share of stopped trials with p < {}.",
        config.significance_level
    );
    println!("At rho = 0 every significant result is a false positive.");
}

/// Group the table by (category, rho) in grid order.
pub fn summarize(table: &ResultTable, alpha: f64) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for category in StoppingCriterion::ALL {
        for rho in table.rhos() {
            let group: Vec<_> = table.group(category, rho).collect();
            if group.is_empty() {
                continue;
            }
            let count = group.len() as f64;
            let significant = group.iter().filter(|r| r.is_significant(alpha)).count();
            rows.push(SummaryRow {
                category,
                rho,
                trials: group.len(),
                proportion_significant: significant as f64 / count,
                mean_n: group.iter().map(|r| r.n as f64).sum::<f64>() / count,
                mean_abs_r: group.iter().map(|r| r.r.abs()).sum::<f64>() / count,
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use optstop_core::{ResultRecord, RhoTable};

    fn record(rho: f64, category: StoppingCriterion, n: usize, r: f64, p: f64) -> ResultRecord {
        ResultRecord {
            rho,
            category,
            n,
            r,
            p,
        }
    }

    #[test]
    fn test_summarize_groups() {
        let mut zero = RhoTable::new(0.0);
        zero.push(record(0.0, StoppingCriterion::SignificantOnly, 10, 0.6, 0.01));
        zero.push(record(0.0, StoppingCriterion::SignificantOnly, 30, -0.2, 0.3));
        zero.push(record(0.0, StoppingCriterion::SignificantOrLowP, 3, 0.1, 0.9));
        let mut half = RhoTable::new(0.5);
        half.push(record(0.5, StoppingCriterion::SignificantOnly, 8, 0.7, 0.02));
        let table = ResultTable::concat(vec![zero, half]);

        let rows = summarize(&table, 0.05);
        assert_eq!(rows.len(), 3);

        let only_zero = &rows[0];
        assert_eq!(only_zero.category, StoppingCriterion::SignificantOnly);
        assert_eq!(only_zero.rho, 0.0);
        assert_eq!(only_zero.trials, 2);
        assert!((only_zero.proportion_significant - 0.5).abs() < 1e-12);
        assert!((only_zero.mean_n - 20.0).abs() < 1e-12);
        assert!((only_zero.mean_abs_r - 0.4).abs() < 1e-12);

        assert_eq!(rows[1].rho, 0.5);
        assert_eq!(rows[2].category, StoppingCriterion::SignificantOrLowP);
        assert_eq!(rows[2].proportion_significant, 0.0);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&ResultTable::default(), 0.05).is_empty());
    }
}
