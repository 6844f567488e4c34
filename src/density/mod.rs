//! Breeden-Litzenberger density extraction.
//!
//! The risk-neutral density of the underlying at expiry is
//! `p(K) = e^(rT) * d2C/dK2`. On a uniform strike grid the second derivative
//! comes from central differences, which costs the two endpoint strikes.
//! Negative raw values are clamped to zero *before* the trapezoidal
//! normalization; inverting that order changes the output whenever the raw
//! curve dips negative, so it is pinned by tests.

use crate::error::NumericalError;
use serde::Serialize;

/// Relative tolerance for the uniform-spacing precondition.
const SPACING_REL_TOL: f64 = 1e-6;

/// Strike/density pairs over the interior of the dense grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    /// Interior grid strikes (dense grid minus its two endpoints)
    pub strikes: Vec<f64>,
    /// Non-negative density values; integrate to 1 unless the run degenerated
    pub values: Vec<f64>,
}

/// Summary statistics of a normalized density curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensitySummary {
    /// Modal strike (location of the density peak)
    pub peak_strike: f64,
    /// Mean of the distribution
    pub mean: f64,
    /// Standard deviation of the distribution
    pub std_dev: f64,
    /// 5th percentile strike
    pub p05: f64,
    /// 95th percentile strike
    pub p95: f64,
    /// Trapezoidal integral of the stored values
    pub integral: f64,
}

impl DensityCurve {
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Trapezoidal integral of the stored values over the stored strikes.
    pub fn integral(&self) -> f64 {
        trapezoid(&self.strikes, &self.values)
    }

    /// Summary statistics, or `None` for a degenerate (zero-mass) curve.
    pub fn summary(&self) -> Option<DensitySummary> {
        let integral = self.integral();
        if !(integral > 0.0) || self.len() < 2 {
            return None;
        }

        let peak_idx = self
            .values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mean_values: Vec<f64> = self
            .strikes
            .iter()
            .zip(&self.values)
            .map(|(k, p)| k * p)
            .collect();
        let mean = trapezoid(&self.strikes, &mean_values) / integral;

        let var_values: Vec<f64> = self
            .strikes
            .iter()
            .zip(&self.values)
            .map(|(k, p)| (k - mean) * (k - mean) * p)
            .collect();
        let variance = trapezoid(&self.strikes, &var_values) / integral;

        Some(DensitySummary {
            peak_strike: self.strikes[peak_idx],
            mean,
            std_dev: variance.max(0.0).sqrt(),
            p05: self.percentile(0.05, integral),
            p95: self.percentile(0.95, integral),
            integral,
        })
    }

    /// Strike at which the cumulative mass first reaches `q` of the total.
    fn percentile(&self, q: f64, total: f64) -> f64 {
        let target = q * total;
        let mut cumulative = 0.0;
        for i in 1..self.strikes.len() {
            let dk = self.strikes[i] - self.strikes[i - 1];
            cumulative += 0.5 * (self.values[i] + self.values[i - 1]) * dk;
            if cumulative >= target {
                return self.strikes[i];
            }
        }
        *self.strikes.last().unwrap_or(&f64::NAN)
    }
}

fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    let mut total = 0.0;
    for i in 1..xs.len() {
        total += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
    }
    total
}

/// Recover a normalized risk-neutral density from call prices on a uniform
/// strike grid.
///
/// The grid must be uniformly spaced and carry at least 3 points; the output
/// always has exactly `strikes.len() - 2` points. When the clamped raw
/// density integrates to a non-positive value (e.g. a flat price curve) the
/// values are left unnormalized rather than treated as an error.
pub fn extract_density(
    strikes: &[f64],
    call_prices: &[f64],
    rate: f64,
    maturity: f64,
) -> Result<DensityCurve, NumericalError> {
    debug_assert_eq!(strikes.len(), call_prices.len());

    let n = strikes.len();
    let dk = if n >= 2 { strikes[1] - strikes[0] } else { 0.0 };
    if dk <= 0.0 {
        return Err(NumericalError::NonPositiveSpacing { spacing: dk });
    }
    for i in 1..n {
        let spacing = strikes[i] - strikes[i - 1];
        if (spacing - dk).abs() > SPACING_REL_TOL * dk {
            return Err(NumericalError::NonUniformGrid { index: i });
        }
    }

    let discount_removal = (rate * maturity).exp();
    let interior_strikes: Vec<f64> = strikes[1..n - 1].to_vec();
    let mut values: Vec<f64> = (1..n - 1)
        .map(|i| {
            let second_deriv = (call_prices[i - 1] - 2.0 * call_prices[i] + call_prices[i + 1]) / (dk * dk);
            // Clamp before normalization, never after.
            (discount_removal * second_deriv).max(0.0)
        })
        .collect();

    let integral = trapezoid(&interior_strikes, &values);
    if integral > 0.0 {
        for value in &mut values {
            *value /= integral;
        }
    }

    Ok(DensityCurve {
        strikes: interior_strikes,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_output_length_is_grid_minus_two() {
        for n in [3usize, 5, 10, 200] {
            let strikes = uniform_grid(50.0, 150.0, n);
            let prices: Vec<f64> = strikes.iter().map(|k| (150.0 - k) * 0.3).collect();
            let curve = extract_density(&strikes, &prices, 0.05, 0.25).unwrap();
            assert_eq!(curve.len(), n - 2);
        }
    }

    #[test]
    fn test_values_nonnegative_and_normalized() {
        // Convex price curve: positive curvature everywhere.
        let strikes = uniform_grid(80.0, 120.0, 100);
        let prices: Vec<f64> = strikes.iter().map(|k| ((100.0 - k) / 10.0).exp()).collect();
        let curve = extract_density(&strikes, &prices, 0.05, 0.25).unwrap();

        assert!(curve.values.iter().all(|&v| v >= 0.0));
        assert!((curve.integral() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_prices_skip_normalization() {
        let strikes = uniform_grid(80.0, 120.0, 50);
        let prices = vec![3.25; 50];
        let curve = extract_density(&strikes, &prices, 0.05, 0.25).unwrap();

        assert_eq!(curve.len(), 48);
        assert!(curve.values.iter().all(|&v| v == 0.0));
        assert_eq!(curve.integral(), 0.0);
        assert!(curve.summary().is_none());
    }

    #[test]
    fn test_clamp_happens_before_normalization() {
        // Alternating convex/concave price curve. Clamp-then-normalize keeps
        // only the positive-curvature mass and scales it to 1; normalizing
        // first would scale by the much smaller net integral.
        let strikes = uniform_grid(0.0, 10.0, 11);
        let prices: Vec<f64> = strikes.iter().map(|k| (k * 1.8).sin()).collect();
        let curve = extract_density(&strikes, &prices, 0.0, 1.0).unwrap();

        assert!(curve.values.iter().all(|&v| v >= 0.0));
        // Some regions were genuinely negative pre-clamp and are now zero.
        assert!(curve.values.iter().any(|&v| v == 0.0));
        assert!(curve.values.iter().any(|&v| v > 0.0));
        assert!((curve.integral() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_uniform_grid_rejected() {
        let strikes = vec![1.0, 2.0, 3.5, 4.0];
        let prices = vec![1.0; 4];
        assert!(matches!(
            extract_density(&strikes, &prices, 0.0, 1.0),
            Err(NumericalError::NonUniformGrid { .. })
        ));
    }

    #[test]
    fn test_descending_grid_rejected() {
        let strikes = vec![3.0, 2.0, 1.0];
        let prices = vec![1.0; 3];
        assert!(matches!(
            extract_density(&strikes, &prices, 0.0, 1.0),
            Err(NumericalError::NonPositiveSpacing { .. })
        ));
    }

    #[test]
    fn test_summary_statistics_on_triangle_density() {
        // Symmetric triangular density centered at 100.
        let strikes = uniform_grid(90.0, 110.0, 201);
        let values: Vec<f64> = strikes
            .iter()
            .map(|k| (10.0 - (k - 100.0_f64).abs()).max(0.0) / 100.0)
            .collect();
        let curve = DensityCurve {
            strikes,
            values,
        };
        let summary = curve.summary().unwrap();

        assert!((summary.integral - 1.0).abs() < 1e-6);
        assert!((summary.peak_strike - 100.0).abs() < 0.11);
        assert!((summary.mean - 100.0).abs() < 0.01);
        assert!(summary.p05 < summary.peak_strike);
        assert!(summary.p95 > summary.peak_strike);
        // Triangular distribution with half-width 10: std = 10 / sqrt(6).
        assert!((summary.std_dev - 10.0 / 6.0_f64.sqrt()).abs() < 0.05);
    }
}
