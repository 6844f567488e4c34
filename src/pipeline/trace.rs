//! Ordered diagnostic events emitted while the pipeline runs.
//!
//! The trace is a pure output artifact: stages append events, nothing reads
//! them back. Callers can render the events as a log via [`Display`], ignore
//! them, or forward them to an analysis layer.
//!
//! [`Display`]: std::fmt::Display

use serde::Serialize;
use std::fmt;

/// One diagnostic event, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TraceEvent {
    /// Input validation finished with this many cleaned quotes.
    QuotesValidated {
        /// Number of quotes accepted into the run
        count: usize,
    },

    /// Implied-vol inversion finished.
    IvInversion {
        /// Points accepted into the smile dataset
        accepted: usize,
        /// Points dropped (failed inversion or outside the band)
        rejected: usize,
    },

    /// Starting point handed to the optimizer, [a, b, rho, m, sigma].
    InitialGuess {
        /// Parameter vector
        params: [f64; 5],
    },

    /// What the optimizer reported back.
    OptimizerResult {
        /// Whether the routine reported success
        converged: bool,
        /// Objective evaluations performed
        iterations: usize,
        /// Final sum-of-squares objective
        objective: f64,
    },

    /// The parameter vector actually adopted, [a, b, rho, m, sigma].
    OptimalParameters {
        /// Parameter vector
        params: [f64; 5],
    },

    /// Density extraction finished.
    DensityExtracted {
        /// Interior grid points carrying density values
        points: usize,
        /// Trapezoidal integral after normalization policy was applied
        integral: f64,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::QuotesValidated { count } => {
                write!(f, "Validated {} liquid quotes", count)
            }
            TraceEvent::IvInversion { accepted, rejected } => {
                write!(
                    f,
                    "Calculated IV for {} options ({} rejected)",
                    accepted, rejected
                )
            }
            TraceEvent::InitialGuess { params } => {
                write!(
                    f,
                    "Initial: a={:.4}, b={:.4}, rho={:.4}, m={:.4}, sigma={:.4}",
                    params[0], params[1], params[2], params[3], params[4]
                )
            }
            TraceEvent::OptimizerResult {
                converged,
                iterations,
                objective,
            } => {
                write!(
                    f,
                    "Converged: {}, Iterations: {}, Error: {:.6}",
                    converged, iterations, objective
                )
            }
            TraceEvent::OptimalParameters { params } => {
                write!(
                    f,
                    "Optimal: a={:.6}, b={:.6}, rho={:.6}, m={:.6}, sigma={:.6}",
                    params[0], params[1], params[2], params[3], params[4]
                )
            }
            TraceEvent::DensityExtracted { points, integral } => {
                write!(
                    f,
                    "PDF extracted at {} points, integral: {:.4}",
                    points, integral
                )
            }
        }
    }
}

/// Append-only sequence of [`TraceEvent`]s for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibrationTrace {
    events: Vec<TraceEvent>,
}

impl CalibrationTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Events in emission order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Human-readable rendering, one line per event.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
