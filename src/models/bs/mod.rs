// Black-Scholes call pricing and vega, the two closed-form pieces the
// implied-volatility solver and the density extractor re-price through.

pub mod implied_vol;

use statrs::distribution::{Continuous, Normal};

fn norm_cdf(x: f64) -> f64 {
    // 0.5 * [1 + erf(x / sqrt(2))]
    0.5 * (1.0 + libm::erf(x / (2.0_f64).sqrt()))
}

/// Standard normal density, used for vega.
fn norm_pdf(x: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    normal.pdf(x)
}

/// Price of a European call option under Black-Scholes assumptions.
///
/// Degenerate inputs (maturity <= 0 or volatility <= 0) price at intrinsic
/// value `max(S - K, 0)` rather than erroring.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, T: f64, r: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (S - K).max(0.0);
    }
    let d1 = ((S / K).ln() + (r + 0.5 * sigma.powi(2)) * T) / (sigma * T.sqrt());
    let d2 = d1 - sigma * T.sqrt();
    S * norm_cdf(d1) - K * (-r * T).exp() * norm_cdf(d2)
}

/// Sensitivity of the call price to volatility.
///
/// Zero under the same degenerate conditions where [`bs_call_price`] falls
/// back to intrinsic value.
#[allow(non_snake_case)]
pub fn bs_vega(S: f64, K: f64, T: f64, r: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return 0.0;
    }
    let d1 = ((S / K).ln() + (r + 0.5 * sigma.powi(2)) * T) / (sigma * T.sqrt());
    S * norm_pdf(d1) * T.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_inputs_price_at_intrinsic() {
        assert_eq!(bs_call_price(100.0, 90.0, 0.0, 0.05, 0.2), 10.0);
        assert_eq!(bs_call_price(100.0, 110.0, 0.25, 0.05, 0.0), 0.0);
        assert_eq!(bs_call_price(100.0, 90.0, 0.25, 0.05, -0.1), 10.0);
        assert_eq!(bs_vega(100.0, 100.0, 0.0, 0.05, 0.2), 0.0);
        assert_eq!(bs_vega(100.0, 100.0, 0.25, 0.05, 0.0), 0.0);
    }

    #[test]
    fn test_vanishing_vol_converges_to_intrinsic() {
        // With r = 0 the small-vol limit is exactly max(S - K, 0). At the
        // money the price decays like S * sigma * sqrt(T / 2pi), so the vol
        // must sit well below the tolerance.
        for strike in [90.0, 100.0, 110.0] {
            let price = bs_call_price(100.0, strike, 0.25, 0.0, 1e-12);
            let intrinsic = (100.0_f64 - strike).max(0.0);
            assert!(
                (price - intrinsic).abs() < 1e-8,
                "strike {}: price {} vs intrinsic {}",
                strike,
                price,
                intrinsic
            );
        }
    }

    #[test]
    fn test_atm_call_price_sanity() {
        // ATM call, S=100, T=1, r=0, sigma=0.2 prices near 7.97.
        let price = bs_call_price(100.0, 100.0, 1.0, 0.0, 0.2);
        assert!((price - 7.9656).abs() < 1e-3, "got {}", price);
    }

    #[test]
    fn test_vega_positive_and_peaks_near_atm() {
        let atm = bs_vega(100.0, 100.0, 0.5, 0.02, 0.3);
        let otm = bs_vega(100.0, 130.0, 0.5, 0.02, 0.3);
        assert!(atm > 0.0);
        assert!(otm > 0.0);
        assert!(atm > otm);
    }

    #[test]
    fn test_price_monotone_in_vol() {
        let lo = bs_call_price(100.0, 105.0, 0.5, 0.02, 0.1);
        let hi = bs_call_price(100.0, 105.0, 0.5, 0.02, 0.4);
        assert!(hi > lo);
    }
}
