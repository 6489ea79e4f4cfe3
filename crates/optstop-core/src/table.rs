//! Result rows and tables.
//!
//! Trials emit [`ResultRecord`]s, the orchestrator collects them into one
//! [`RhoTable`] per ρ, and [`ResultTable::concat`] merges the per-ρ tables into
//! the unified dataset consumed downstream.

use serde::Serialize;

use crate::stopping::StoppingCriterion;

/// One stopping event: where a criterion stopped in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultRecord {
    pub rho: f64,
    pub category: StoppingCriterion,
    /// Sample size at stop.
    pub n: usize,
    /// Observed correlation at stop.
    pub r: f64,
    /// p-value at stop.
    pub p: f64,
}

impl ResultRecord {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p < alpha
    }
}

/// All records produced for a single ρ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhoTable {
    pub rho: f64,
    pub records: Vec<ResultRecord>,
}

impl RhoTable {
    pub fn new(rho: f64) -> Self {
        Self {
            rho,
            records: Vec::new(),
        }
    }

    pub fn with_capacity(rho: f64, capacity: usize) -> Self {
        Self {
            rho,
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }
}

/// The unified result dataset. Row order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    /// Concatenate per-ρ tables, keeping every record as is.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = RhoTable>,
    {
        let mut records = Vec::new();
        for table in tables {
            records.extend(table.records);
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    /// Distinct ρ values in order of first appearance.
    pub fn rhos(&self) -> Vec<f64> {
        let mut seen: Vec<f64> = Vec::new();
        for record in &self.records {
            if !seen.iter().any(|&r| r == record.rho) {
                seen.push(record.rho);
            }
        }
        seen
    }

    /// Rows for one (category, ρ) group.
    pub fn group(
        &self,
        category: StoppingCriterion,
        rho: f64,
    ) -> impl Iterator<Item = &ResultRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.category == category && r.rho == rho)
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
