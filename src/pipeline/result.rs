//! The immutable result bundle handed back to the caller.

use crate::calibration::types::{ImpliedVolPoint, Quote};
use crate::density::DensityCurve;
use crate::models::svi::svi_model::SviParameters;
use crate::pipeline::trace::CalibrationTrace;
use serde::Serialize;

/// The calibrated smile evaluated on the dense strike grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothCurve {
    /// Uniformly spaced strikes spanning the accepted IV points
    pub strikes: Vec<f64>,
    /// Fitted implied volatility at each grid strike
    pub vols: Vec<f64>,
    /// Re-priced call value at each grid strike
    pub call_prices: Vec<f64>,
}

impl SmoothCurve {
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}

/// Implied-vol smile diagnostics relative to the current spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmileSummary {
    /// Implied vol of the accepted point with strike closest to spot
    pub atm_vol: f64,
    /// Highest accepted implied vol
    pub max_vol: f64,
    /// Lowest accepted implied vol
    pub min_vol: f64,
    /// Mean OTM-put vol minus mean OTM-call vol (wings beyond +/-5% of spot);
    /// `None` when either wing is empty
    pub put_call_skew: Option<f64>,
}

/// Everything one pipeline run produces. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// The cleaned quotes the run started from
    pub quotes: Vec<Quote>,
    /// Accepted implied-vol points (possibly a strict subset of the quotes)
    pub iv_points: Vec<ImpliedVolPoint>,
    /// The calibrated smile on the dense grid
    pub smooth_curve: SmoothCurve,
    /// The extracted risk-neutral density
    pub density: DensityCurve,
    /// Fitted SVI parameters
    pub svi_params: SviParameters,
    /// Time to expiry in years
    pub maturity: f64,
    /// Ordered diagnostics from the run
    pub trace: CalibrationTrace,
}

impl PipelineResult {
    /// Smile diagnostics around the given spot price.
    pub fn smile_summary(&self, spot: f64) -> Option<SmileSummary> {
        if self.iv_points.is_empty() {
            return None;
        }

        let atm = self
            .iv_points
            .iter()
            .min_by(|a, b| {
                let da = (a.strike - spot).abs();
                let db = (b.strike - spot).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.vol)?;

        let max_vol = self.iv_points.iter().map(|p| p.vol).fold(f64::MIN, f64::max);
        let min_vol = self.iv_points.iter().map(|p| p.vol).fold(f64::MAX, f64::min);

        let put_wing: Vec<f64> = self
            .iv_points
            .iter()
            .filter(|p| p.strike < spot * 0.95)
            .map(|p| p.vol)
            .collect();
        let call_wing: Vec<f64> = self
            .iv_points
            .iter()
            .filter(|p| p.strike > spot * 1.05)
            .map(|p| p.vol)
            .collect();
        let put_call_skew = if put_wing.is_empty() || call_wing.is_empty() {
            None
        } else {
            let put_avg = put_wing.iter().sum::<f64>() / put_wing.len() as f64;
            let call_avg = call_wing.iter().sum::<f64>() / call_wing.len() as f64;
            Some(put_avg - call_avg)
        };

        Some(SmileSummary {
            atm_vol: atm,
            max_vol,
            min_vol,
            put_call_skew,
        })
    }
}
