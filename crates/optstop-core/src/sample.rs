//! Correlated bivariate normal samples.
//!
//! A trial draws its whole sample once, up front. Every prefix analysed during
//! the trial is a genuine prefix of that one batch, so re-testing at a larger n
//! reuses all earlier observations plus new ones.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::validate_rho;
use crate::error::SimulationError;

/// A fixed batch of paired observations with unit variances and mean zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BivariateSample {
    rho: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl BivariateSample {
    /// Draw `len` pairs from a bivariate normal with correlation `rho`.
    ///
    /// Each pair is `x = z1`, `y = rho * z1 + sqrt(1 - rho^2) * z2` for
    /// independent standard normals `z1`, `z2`.
    pub fn draw<R: Rng + ?Sized>(
        rho: f64,
        len: usize,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        validate_rho(rho)?;
        let residual = (1.0 - rho * rho).max(0.0).sqrt();
        let mut x = Vec::with_capacity(len);
        let mut y = Vec::with_capacity(len);
        for _ in 0..len {
            let z1: f64 = StandardNormal.sample(rng);
            let z2: f64 = StandardNormal.sample(rng);
            x.push(z1);
            y.push(rho * z1 + residual * z2);
        }
        Ok(Self { rho, x, y })
    }

    /// Wrap explicit columns, skipping the draw.
    #[cfg(test)]
    pub(crate) fn from_columns(rho: f64, x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len());
        Self { rho, x, y }
    }

    /// Population correlation the sample was drawn with.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// First `n` observations of each variable (clamped to the sample length).
    pub fn prefix(&self, n: usize) -> (&[f64], &[f64]) {
        let n = n.min(self.len());
        (&self.x[..n], &self.y[..n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draw_length_and_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = BivariateSample::draw(0.3, 150, &mut rng).unwrap();
        assert_eq!(sample.len(), 150);
        assert_eq!(sample.rho(), 0.3);
        let (x10, y10) = sample.prefix(10);
        let (x20, y20) = sample.prefix(20);
        assert_eq!(x10, &x20[..10]);
        assert_eq!(y10, &y20[..10]);
        assert_eq!(sample.prefix(500).0.len(), 150);
    }

    #[test]
    fn test_rejects_invalid_rho() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            BivariateSample::draw(1.5, 10, &mut rng),
            Err(SimulationError::InvalidParameter { name: "rho", .. })
        ));
        assert!(BivariateSample::draw(-1.01, 10, &mut rng).is_err());
    }

    #[test]
    fn test_same_seed_same_sample() {
        let a = BivariateSample::draw(0.5, 50, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = BivariateSample::draw(0.5, 50, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_perfect_correlation() {
        let mut rng = StdRng::seed_from_u64(3);
        let sample = BivariateSample::draw(1.0, 20, &mut rng).unwrap();
        let (x, y) = sample.prefix(20);
        assert_eq!(x, y);
        let neg = BivariateSample::draw(-1.0, 20, &mut rng).unwrap();
        let (x, y) = neg.prefix(20);
        assert!(x.iter().zip(y).all(|(a, b)| *a == -*b));
    }

    #[test]
    fn test_moments_match_population() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let sample = BivariateSample::draw(0.6, n, &mut rng).unwrap();
        let (x, y) = sample.prefix(n);
        let mean_x = x.iter().sum::<f64>() / n as f64;
        let var_x = x.iter().map(|v| (v - mean_x).powi(2)).sum::<f64>() / n as f64;
        let mean_y = y.iter().sum::<f64>() / n as f64;
        let var_y = y.iter().map(|v| (v - mean_y).powi(2)).sum::<f64>() / n as f64;
        let r = optstop_stats::pearson_r(x, y).unwrap();
        assert!(mean_x.abs() < 0.05, "mean_x = {mean_x}");
        assert!(mean_y.abs() < 0.05, "mean_y = {mean_y}");
        assert!((var_x - 1.0).abs() < 0.05, "var_x = {var_x}");
        assert!((var_y - 1.0).abs() < 0.05, "var_y = {var_y}");
        assert!((r - 0.6).abs() < 0.03, "r = {r}");
    }
}
