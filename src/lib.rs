//! Risk-neutral density extraction from listed option quotes.
//!
//! Given a strip of European call mid quotes at a single maturity, this crate
//! runs a four-stage pipeline:
//!
//! 1. invert each quote to a Black-Scholes implied volatility
//!    (Newton-Raphson, silently dropping quotes that fail or land outside
//!    the acceptance band),
//! 2. fit an SVI total-variance smile to the surviving points with a
//!    bound-constrained L-BFGS-B least-squares calibration,
//! 3. re-price calls from the fitted smile on a uniform dense strike grid,
//! 4. differentiate the smooth prices twice (Breeden-Litzenberger) to
//!    recover the risk-neutral probability density.
//!
//! ```no_run
//! use density_lib::{run_pipeline, MarketSnapshot, PipelineConfig, Quote};
//!
//! let snapshot = MarketSnapshot {
//!     quotes: vec![
//!         Quote { strike: 90.0, mid: 12.10 },
//!         Quote { strike: 95.0, mid: 8.35 },
//!         Quote { strike: 100.0, mid: 5.30 },
//!         Quote { strike: 105.0, mid: 3.05 },
//!         Quote { strike: 110.0, mid: 1.65 },
//!     ],
//!     spot: 100.0,
//!     rate: 0.05,
//!     maturity: 0.25,
//! };
//! let result = run_pipeline(&snapshot, PipelineConfig::default())?;
//! println!("density integral: {:.4}", result.density.integral());
//! # Ok::<(), density_lib::PipelineError>(())
//! ```

pub mod calibration;
pub mod density;
pub mod error;
pub mod models;
pub mod pipeline;

pub use calibration::config::PipelineConfig;
pub use calibration::types::{ImpliedVolPoint, MarketSnapshot, Quote};
pub use density::{DensityCurve, DensitySummary};
pub use error::{ConfigError, InputError, NumericalError, PipelineError};
pub use models::svi::svi_model::{SviParameters, SviSlice};
pub use pipeline::result::{PipelineResult, SmileSummary, SmoothCurve};
pub use pipeline::trace::{CalibrationTrace, TraceEvent};
pub use pipeline::{run_pipeline, DensityPipeline, PipelineStage};
