//! Plain data rows flowing through the pipeline.

use serde::{Deserialize, Serialize};

/// One cleaned call quote for the target expiry.
///
/// The upstream provider is responsible for liquidity filtering (volume > 0,
/// bid > 0), computing mid = (bid + ask) / 2, deduplicating strikes and
/// sorting strictly ascending. The pipeline validates the ordering contract
/// but never re-filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Strike price, > 0
    pub strike: f64,
    /// Mid price (bid + ask) / 2, > 0
    pub mid: f64,
}

/// A strike whose quote successfully inverted to an in-band implied vol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolPoint {
    /// Strike price
    pub strike: f64,
    /// Implied volatility, strictly inside the acceptance band
    pub vol: f64,
}

/// The complete market input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Cleaned quotes, strictly ascending by strike
    pub quotes: Vec<Quote>,
    /// Current underlying price
    pub spot: f64,
    /// Annualized continuously-compounded risk-free rate
    pub rate: f64,
    /// Time to expiry in years
    pub maturity: f64,
}

impl MarketSnapshot {
    /// Forward price F = spot * e^(rate * maturity).
    pub fn forward(&self) -> f64 {
        self.spot * (self.rate * self.maturity).exp()
    }
}
