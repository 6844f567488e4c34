//! Sequences the numerical stages over one market snapshot.
//!
//! `Idle -> InputsValidated -> IvExtracted -> SmileCalibrated ->
//! DensityExtracted -> Complete`, with `Errored` terminal from any stage.
//! Each stage consumes immutable values and produces a new immutable value;
//! on the first failure the run aborts with a typed error and no partial
//! result. The pipeline performs no I/O and holds no state across runs, so
//! identical inputs produce identical output.

pub mod result;
pub mod trace;

use crate::calibration::config::PipelineConfig;
use crate::calibration::types::{ImpliedVolPoint, MarketSnapshot};
use crate::density::extract_density;
use crate::error::{ConfigError, InputError, NumericalError, PipelineError};
use crate::models::bs::{bs_call_price, implied_vol::invert_call_price};
use crate::models::svi::{svi_calibrator::calibrate_smile, svi_model::SviSlice};
use crate::models::utils::log_moneyness;
use result::{PipelineResult, SmoothCurve};
use trace::{CalibrationTrace, TraceEvent};
use tracing::{debug, warn};

/// Where a run currently stands. Diagnostic only; stages always advance in
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    InputsValidated,
    IvExtracted,
    SmileCalibrated,
    DensityExtracted,
    Complete,
    Errored,
}

/// One-shot orchestrator: build it, run it, take the result.
#[derive(Debug)]
pub struct DensityPipeline {
    config: PipelineConfig,
    stage: PipelineStage,
    trace: CalibrationTrace,
}

impl DensityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stage: PipelineStage::Idle,
            trace: CalibrationTrace::new(),
        }
    }

    /// Run the full pipeline over one snapshot, consuming the orchestrator.
    pub fn run(mut self, snapshot: &MarketSnapshot) -> Result<PipelineResult, PipelineError> {
        match self.execute(snapshot) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.stage = PipelineStage::Errored;
                warn!(stage = ?self.stage, error = %err, "pipeline aborted");
                Err(err)
            }
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        debug!(from = ?self.stage, to = ?stage, "pipeline stage transition");
        self.stage = stage;
    }

    fn execute(&mut self, snapshot: &MarketSnapshot) -> Result<PipelineResult, PipelineError> {
        self.validate_inputs(snapshot)?;
        self.advance(PipelineStage::InputsValidated);
        self.trace.push(TraceEvent::QuotesValidated {
            count: snapshot.quotes.len(),
        });

        let iv_points = self.extract_iv_points(snapshot)?;
        self.advance(PipelineStage::IvExtracted);

        let forward = snapshot.forward();
        let svi_params = calibrate_smile(
            &iv_points,
            forward,
            snapshot.maturity,
            &self.config,
            &mut self.trace,
        )?;
        self.advance(PipelineStage::SmileCalibrated);

        let smooth_curve = self.build_smooth_curve(&iv_points, snapshot, forward, svi_params)?;
        let density = extract_density(
            &smooth_curve.strikes,
            &smooth_curve.call_prices,
            snapshot.rate,
            snapshot.maturity,
        )
        .map_err(PipelineError::Numerical)?;
        self.advance(PipelineStage::DensityExtracted);
        self.trace.push(TraceEvent::DensityExtracted {
            points: density.len(),
            integral: density.integral(),
        });

        self.advance(PipelineStage::Complete);
        Ok(PipelineResult {
            quotes: snapshot.quotes.clone(),
            iv_points,
            smooth_curve,
            density,
            svi_params,
            maturity: snapshot.maturity,
            trace: std::mem::take(&mut self.trace),
        })
    }

    fn validate_inputs(&self, snapshot: &MarketSnapshot) -> Result<(), PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;

        if !(snapshot.maturity > 0.0) || !snapshot.maturity.is_finite() {
            return Err(ConfigError::InvalidMaturity(snapshot.maturity).into());
        }
        if !(snapshot.spot > 0.0) || !snapshot.spot.is_finite() {
            return Err(ConfigError::InvalidSpot(snapshot.spot).into());
        }
        if !snapshot.rate.is_finite() {
            return Err(ConfigError::InvalidRate(snapshot.rate).into());
        }

        if snapshot.quotes.len() < self.config.min_quotes {
            return Err(InputError::InsufficientQuotes {
                got: snapshot.quotes.len(),
                need: self.config.min_quotes,
            }
            .into());
        }
        for (i, quote) in snapshot.quotes.iter().enumerate() {
            if !(quote.strike > 0.0) || !(quote.mid > 0.0) {
                return Err(InputError::NonPositiveQuote { strike: quote.strike }.into());
            }
            if i > 0 && quote.strike <= snapshot.quotes[i - 1].strike {
                return Err(InputError::UnsortedStrikes { index: i }.into());
            }
        }
        Ok(())
    }

    /// Invert every quote, keeping only vols strictly inside the acceptance
    /// band. Individual failures are dropped silently; only wholesale failure
    /// escalates.
    fn extract_iv_points(
        &mut self,
        snapshot: &MarketSnapshot,
    ) -> Result<Vec<ImpliedVolPoint>, PipelineError> {
        let mut accepted = Vec::with_capacity(snapshot.quotes.len());
        let mut any_inverted = false;

        for quote in &snapshot.quotes {
            let Some(vol) = invert_call_price(
                quote.mid,
                snapshot.spot,
                quote.strike,
                snapshot.maturity,
                snapshot.rate,
            ) else {
                continue;
            };
            any_inverted = true;
            if vol > self.config.iv_lower_bound && vol < self.config.iv_upper_bound {
                accepted.push(ImpliedVolPoint {
                    strike: quote.strike,
                    vol,
                });
            }
        }

        self.trace.push(TraceEvent::IvInversion {
            accepted: accepted.len(),
            rejected: snapshot.quotes.len() - accepted.len(),
        });

        if !any_inverted {
            return Err(NumericalError::AllInversionsInvalid {
                attempted: snapshot.quotes.len(),
            }
            .into());
        }
        if accepted.len() < self.config.min_iv_points {
            return Err(InputError::InsufficientIvPoints {
                got: accepted.len(),
                need: self.config.min_iv_points,
            }
            .into());
        }
        Ok(accepted)
    }

    /// Evaluate the calibrated smile on a uniform dense grid spanning the
    /// accepted IV points and re-price a call at every grid strike.
    fn build_smooth_curve(
        &self,
        iv_points: &[ImpliedVolPoint],
        snapshot: &MarketSnapshot,
        forward: f64,
        svi_params: crate::models::svi::svi_model::SviParameters,
    ) -> Result<SmoothCurve, PipelineError> {
        let min_strike = iv_points.first().map(|p| p.strike).unwrap_or(0.0);
        let max_strike = iv_points.last().map(|p| p.strike).unwrap_or(0.0);
        if !(max_strike > min_strike) {
            return Err(InputError::DegenerateStrikeRange { strike: min_strike }.into());
        }

        let n = self.config.grid_size;
        let slice = SviSlice::new(svi_params, snapshot.maturity);

        let mut strikes = Vec::with_capacity(n);
        let mut vols = Vec::with_capacity(n);
        let mut call_prices = Vec::with_capacity(n);
        for i in 0..n {
            let strike = min_strike + (max_strike - min_strike) * i as f64 / (n - 1) as f64;
            let vol = slice.implied_vol(log_moneyness(strike, forward));
            let price = bs_call_price(
                snapshot.spot,
                strike,
                snapshot.maturity,
                snapshot.rate,
                vol,
            );
            strikes.push(strike);
            vols.push(vol);
            call_prices.push(price);
        }

        Ok(SmoothCurve {
            strikes,
            vols,
            call_prices,
        })
    }
}

/// Convenience wrapper: one snapshot in, one result out.
pub fn run_pipeline(
    snapshot: &MarketSnapshot,
    config: PipelineConfig,
) -> Result<PipelineResult, PipelineError> {
    DensityPipeline::new(config).run(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::types::Quote;

    fn snapshot_with_quotes(quotes: Vec<Quote>) -> MarketSnapshot {
        MarketSnapshot {
            quotes,
            spot: 100.0,
            rate: 0.05,
            maturity: 0.25,
        }
    }

    #[test]
    fn test_too_few_quotes_is_input_error() {
        let quotes: Vec<Quote> = (0..4)
            .map(|i| Quote {
                strike: 90.0 + 5.0 * i as f64,
                mid: 10.0 - 2.0 * i as f64,
            })
            .collect();
        let err = run_pipeline(&snapshot_with_quotes(quotes), PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Input(InputError::InsufficientQuotes { got: 4, need: 5 })
        ));
    }

    #[test]
    fn test_negative_maturity_is_config_error() {
        let mut snapshot = snapshot_with_quotes(
            (0..6)
                .map(|i| Quote {
                    strike: 90.0 + 4.0 * i as f64,
                    mid: 5.0,
                })
                .collect(),
        );
        snapshot.maturity = -0.1;
        let err = run_pipeline(&snapshot, PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::InvalidMaturity(_))));
    }

    #[test]
    fn test_unsorted_strikes_rejected() {
        let quotes = vec![
            Quote { strike: 90.0, mid: 12.0 },
            Quote { strike: 95.0, mid: 8.0 },
            Quote { strike: 95.0, mid: 8.0 }, // duplicate
            Quote { strike: 100.0, mid: 5.0 },
            Quote { strike: 105.0, mid: 3.0 },
        ];
        let err = run_pipeline(&snapshot_with_quotes(quotes), PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Input(InputError::UnsortedStrikes { index: 2 })
        ));
    }

    #[test]
    fn test_all_inversions_invalid_is_numerical_error() {
        // Every mid sits below the discounted intrinsic bound.
        let quotes: Vec<Quote> = (0..6)
            .map(|i| Quote {
                strike: 50.0 + 2.0 * i as f64,
                mid: 0.001,
            })
            .collect();
        let err = run_pipeline(&snapshot_with_quotes(quotes), PipelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Numerical(NumericalError::AllInversionsInvalid { attempted: 6 })
        ));
    }
}
