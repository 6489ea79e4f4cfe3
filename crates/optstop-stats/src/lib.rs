//! Pearson correlation significance testing.
//!
//! Computes the product-moment correlation over a paired sample and the
//! two-sided p-value for the null hypothesis of zero correlation, using the
//! t statistic `t = r * sqrt((n - 2) / (1 - r^2))` with `n - 2` degrees of
//! freedom.
//!
//! Every call recomputes from the full slice it is given. Sequential-sampling
//! callers pass a growing prefix of one fixed sample, so each result matches a
//! direct computation on that prefix exactly.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Smallest sample with a defined test (one degree of freedom).
pub const MIN_PAIRS: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a correlation test over `n` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationTest {
    pub n: usize,
    /// Pearson r, clamped to [-1, 1].
    pub r: f64,
    /// t statistic with `n - 2` degrees of freedom.
    pub statistic: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
}

impl CorrelationTest {
    /// Result used when the test is undefined for a prefix: r = 0, p = 1.
    pub fn non_significant(n: usize) -> Self {
        Self {
            n,
            r: 0.0,
            statistic: 0.0,
            p_value: 1.0,
        }
    }

    /// Whether the p-value falls strictly below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Reasons a correlation test cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationError {
    /// Fewer than [`MIN_PAIRS`] pairs.
    TooFewPairs { needed: usize, got: usize },
    /// The two slices differ in length.
    LengthMismatch { x: usize, y: usize },
    /// One of the variables has zero variance, so r is undefined.
    DegenerateSample,
}

impl std::fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPairs { needed, got } => {
                write!(f, "insufficient data: need {needed} pairs, got {got}")
            }
            Self::LengthMismatch { x, y } => {
                write!(f, "paired samples differ in length: x={x}, y={y}")
            }
            Self::DegenerateSample => write!(f, "zero variance in one or both variables"),
        }
    }
}

impl std::error::Error for CorrelationError {}

// ═══════════════════════════════════════════════════════════════════════════════
// Pearson r
// ═══════════════════════════════════════════════════════════════════════════════

/// Pearson product-moment correlation of two equally long slices.
pub fn pearson_r(x: &[f64], y: &[f64]) -> Result<f64, CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(CorrelationError::TooFewPairs { needed: 2, got: n });
    }

    let mean_x: f64 = x.iter().sum::<f64>() / n as f64;
    let mean_y: f64 = y.iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(CorrelationError::DegenerateSample);
    }
    let r = sxy / (sxx * syy).sqrt();
    Ok(r.clamp(-1.0, 1.0))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Significance
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-sided p-value for an observed r over `n` pairs.
///
/// A perfect correlation (|r| = 1) has an infinite t statistic and p = 0.
pub fn correlation_p_value(r: f64, n: usize) -> Result<(f64, f64), CorrelationError> {
    if n < MIN_PAIRS {
        return Err(CorrelationError::TooFewPairs {
            needed: MIN_PAIRS,
            got: n,
        });
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Ok((f64::INFINITY.copysign(r), 0.0));
    }
    let t = r * (df / denom).sqrt();
    let Ok(dist) = StudentsT::new(0.0, 1.0, df) else {
        return Err(CorrelationError::TooFewPairs {
            needed: MIN_PAIRS,
            got: n,
        });
    };
    let p = (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0);
    Ok((t, p))
}

/// Pearson r and its two-sided t-test over two equally long slices.
pub fn pearson_test(x: &[f64], y: &[f64]) -> Result<CorrelationTest, CorrelationError> {
    let n = x.len();
    if n < MIN_PAIRS {
        return Err(CorrelationError::TooFewPairs {
            needed: MIN_PAIRS,
            got: n,
        });
    }
    let r = pearson_r(x, y)?;
    let (statistic, p_value) = correlation_p_value(r, n)?;
    Ok(CorrelationTest {
        n,
        r,
        statistic,
        p_value,
    })
}
