//! Typed errors for the density pipeline.
//!
//! Failures are grouped into three categories mirroring where the problem
//! originated: the caller's input data, the numerical core, or the run
//! configuration. Per-point implied-volatility failures are not errors at
//! all; those points are dropped before calibration.

use thiserror::Error;

/// Problems with the cleaned-quote input set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// Fewer liquid quotes than the configured minimum.
    #[error("insufficient liquid quotes: got {got}, need at least {need}")]
    InsufficientQuotes {
        /// Number of quotes supplied
        got: usize,
        /// Minimum required
        need: usize,
    },

    /// Too few implied-volatility points survived inversion and band filtering.
    #[error("insufficient implied-volatility points after filtering: got {got}, need at least {need}")]
    InsufficientIvPoints {
        /// Number of accepted IV points
        got: usize,
        /// Minimum required
        need: usize,
    },

    /// Quote strikes are not strictly ascending (or contain duplicates).
    #[error("quote strikes not strictly ascending at index {index}")]
    UnsortedStrikes {
        /// Index of the offending quote
        index: usize,
    },

    /// A quote with non-positive strike or mid-price.
    #[error("non-positive quote at strike {strike}")]
    NonPositiveQuote {
        /// Strike of the offending quote
        strike: f64,
    },

    /// All accepted IV points share one strike, so no dense grid can be built.
    #[error("degenerate strike range: min == max == {strike}")]
    DegenerateStrikeRange {
        /// The single strike value
        strike: f64,
    },
}

/// Failures inside the numerical core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalError {
    /// Newton-Raphson inversion returned INVALID for every quote.
    #[error("implied-volatility inversion failed for all {attempted} quotes")]
    AllInversionsInvalid {
        /// Number of quotes attempted
        attempted: usize,
    },

    /// The optimizer produced a non-finite parameter vector.
    #[error("calibration produced non-finite parameters: {params:?}")]
    NonFiniteParameters {
        /// The offending parameter vector [a, b, rho, m, sigma]
        params: [f64; 5],
    },

    /// Dense grid spacing is zero or negative.
    #[error("non-positive grid spacing: {spacing}")]
    NonPositiveSpacing {
        /// The offending spacing
        spacing: f64,
    },

    /// Dense grid is not uniformly spaced, violating the central-difference
    /// precondition.
    #[error("non-uniform grid spacing at index {index}")]
    NonUniformGrid {
        /// Index of the first non-uniform interval
        index: usize,
    },
}

/// Invalid run configuration or market parameters supplied by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Maturity must be strictly positive (in years).
    #[error("invalid maturity: {0} years")]
    InvalidMaturity(f64),

    /// Spot must be strictly positive.
    #[error("invalid spot price: {0}")]
    InvalidSpot(f64),

    /// Rate must be finite.
    #[error("invalid risk-free rate: {0}")]
    InvalidRate(f64),

    /// The dense grid needs at least 3 points for central differencing.
    #[error("dense grid too small: {size} points, need at least 3")]
    GridTooSmall {
        /// Configured grid size
        size: usize,
    },
}

/// Top-level pipeline error returned to the caller.
///
/// A run either produces a complete [`PipelineResult`](crate::PipelineResult)
/// or exactly one of these; there are no partial results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Invalid or insufficient input data.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Failure inside the numerical core.
    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),

    /// Invalid configuration or market parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = PipelineError::from(InputError::InsufficientQuotes { got: 4, need: 5 });
        assert_eq!(
            format!("{}", err),
            "input error: insufficient liquid quotes: got 4, need at least 5"
        );
    }

    #[test]
    fn test_numerical_error_display() {
        let err = PipelineError::from(NumericalError::NonUniformGrid { index: 7 });
        assert_eq!(
            format!("{}", err),
            "numerical error: non-uniform grid spacing at index 7"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = PipelineError::from(ConfigError::InvalidMaturity(-0.1));
        assert_eq!(
            format!("{}", err),
            "configuration error: invalid maturity: -0.1 years"
        );
    }

    #[test]
    fn test_error_trait_implementation() {
        let err = PipelineError::from(ConfigError::InvalidSpot(0.0));
        let _: &dyn std::error::Error = &err;
    }
}
