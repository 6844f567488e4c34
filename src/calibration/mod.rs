pub mod config;
pub mod types;

// Re-export the optimizer module for easy access inside the library
pub use cmaes_lbfgsb::lbfgsb_optimize;
