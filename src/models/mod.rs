pub mod bs;
pub mod svi;

/// Small shared helpers for the pricing and smile models
pub mod utils {
    /// Log-moneyness relative to the forward: ln(K / F).
    pub fn log_moneyness(strike: f64, forward: f64) -> f64 {
        (strike / forward).ln()
    }

}
