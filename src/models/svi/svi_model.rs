//! Stochastic Volatility Inspired (SVI) model for a single expiry.
//!
//! Total variance as a function of log-moneyness k:
//!
//! w(k) = a + b * (rho * (k - m) + sqrt((k - m)^2 + sigma^2))
//!
//! where:
//! - a: vertical shift (ATM variance level)
//! - b: slope factor (overall variance level)
//! - rho: asymmetry parameter (skew)
//! - m: horizontal shift (smile center in log-moneyness)
//! - sigma: curvature parameter

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Fitted SVI parameters for one expiry slice.
///
/// Created once per calibration and immutable thereafter. The calibrator's
/// box constraints are a >= 0, b >= 0, rho in [-1, 1], sigma > 0, m free.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviParameters {
    /// Vertical shift (ATM variance level)
    pub a: f64,
    /// Slope factor
    pub b: f64,
    /// Asymmetry (skew), in [-1, 1]
    pub rho: f64,
    /// Horizontal shift (smile center)
    pub m: f64,
    /// Curvature, > 0
    pub sigma: f64,
}

fn validate_svi_params(a: f64, b: f64, rho: f64, m: f64, sigma: f64) -> Result<()> {
    if !a.is_finite() || a < 0.0 {
        return Err(anyhow!("SviParameters: a ({}) must be finite and >= 0", a));
    }
    if !b.is_finite() || b < 0.0 {
        return Err(anyhow!("SviParameters: b ({}) must be finite and >= 0", b));
    }
    if !rho.is_finite() || !(-1.0..=1.0).contains(&rho) {
        return Err(anyhow!("SviParameters: rho ({}) must be in [-1, 1]", rho));
    }
    if !m.is_finite() {
        return Err(anyhow!("SviParameters: m ({}) must be finite", m));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(anyhow!("SviParameters: sigma ({}) must be finite and > 0", sigma));
    }
    Ok(())
}

impl SviParameters {
    /// Creates a validated parameter set.
    pub fn new(a: f64, b: f64, rho: f64, m: f64, sigma: f64) -> Result<Self> {
        validate_svi_params(a, b, rho, m, sigma)?;
        Ok(Self { a, b, rho, m, sigma })
    }

    /// Validates the current parameter set.
    pub fn validate(&self) -> Result<()> {
        validate_svi_params(self.a, self.b, self.rho, self.m, self.sigma)
    }

    /// Total variance w(k) at log-moneyness `k`.
    pub fn total_variance(&self, k: f64) -> f64 {
        let k_minus_m = k - self.m;
        let sqrt_term = (k_minus_m * k_minus_m + self.sigma * self.sigma).sqrt();
        self.a + self.b * (self.rho * k_minus_m + sqrt_term)
    }

    /// Parameter vector in optimizer order [a, b, rho, m, sigma].
    pub fn to_vector(&self) -> [f64; 5] {
        [self.a, self.b, self.rho, self.m, self.sigma]
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.rho.is_finite()
            && self.m.is_finite()
            && self.sigma.is_finite()
    }
}

/// An SVI parameter set bound to its maturity, able to produce implied vols.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SviSlice {
    pub params: SviParameters,
    /// Time to expiry in years
    pub t: f64,
}

impl SviSlice {
    pub fn new(params: SviParameters, t: f64) -> Self {
        Self { params, t }
    }

    /// Implied volatility sigma(k) = sqrt(w(k) / t).
    ///
    /// Non-positive total variance is floored to a tiny positive vol so the
    /// re-pricing step never sees NaN.
    pub fn implied_vol(&self, k: f64) -> f64 {
        let total_var = self.params.total_variance(k);
        if total_var <= 0.0 {
            return 1e-6;
        }
        (total_var / self.t).sqrt()
    }
}
