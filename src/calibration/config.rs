//! Pipeline configuration with serde-friendly defaults.

use crate::error::ConfigError;
use serde::Deserialize;

fn default_min_quotes() -> usize {
    5
}
fn default_min_iv_points() -> usize {
    5
}
fn default_iv_lower_bound() -> f64 {
    0.05
}
fn default_iv_upper_bound() -> f64 {
    2.0
}
fn default_grid_size() -> usize {
    200
}
fn default_max_iterations() -> usize {
    500
}
fn default_tolerance() -> f64 {
    1e-8
}

/// Tunables for one pipeline run.
///
/// Every field has a default, so a plain `PipelineConfig::default()`
/// reproduces the canonical pipeline and a TOML file only needs to name the
/// fields it overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Minimum number of liquid quotes required before any numerical work.
    #[serde(default = "default_min_quotes")]
    pub min_quotes: usize,

    /// Minimum number of accepted implied-vol points required for calibration.
    #[serde(default = "default_min_iv_points")]
    pub min_iv_points: usize,

    /// Exclusive lower edge of the implied-vol acceptance band.
    #[serde(default = "default_iv_lower_bound")]
    pub iv_lower_bound: f64,

    /// Exclusive upper edge of the implied-vol acceptance band.
    #[serde(default = "default_iv_upper_bound")]
    pub iv_upper_bound: f64,

    /// Number of points in the dense strike grid.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    /// Iteration cap handed to the L-BFGS-B routine.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence tolerance handed to the L-BFGS-B routine.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_quotes: default_min_quotes(),
            min_iv_points: default_min_iv_points(),
            iv_lower_bound: default_iv_lower_bound(),
            iv_upper_bound: default_iv_upper_bound(),
            grid_size: default_grid_size(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text, filling omitted fields with
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Structural sanity check, run once at the start of a pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 {
            return Err(ConfigError::GridTooSmall { size: self.grid_size });
        }
        Ok(())
    }
}
