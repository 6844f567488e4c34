//! Newton-Raphson implied-volatility inversion.
//!
//! `invert_call_price` maps one observed call price back to the volatility
//! that reproduces it under Black-Scholes. Failure is an `Option::None`, not
//! an error: the caller drops the point and moves on.

use super::{bs_call_price, bs_vega};

/// Newton-Raphson starting point.
const INITIAL_VOL: f64 = 0.30;
/// Iteration cap before giving up and returning the last iterate.
const MAX_ITERATIONS: usize = 100;
/// Below this vega the Newton update is unstable; the point is rejected.
const VEGA_FLOOR: f64 = 1e-10;
/// Absolute price-residual convergence tolerance.
const PRICE_TOLERANCE: f64 = 1e-6;

/// Invert a market call price to an implied volatility.
///
/// Returns `None` when the price sits at or below the discounted intrinsic
/// lower bound `max(S - K * e^(-rT), 0)` (no volatility can reproduce it),
/// when the Newton update hits a flat-vega region, or when an iterate leaves
/// the positive domain.
///
/// After [`MAX_ITERATIONS`] without convergence the last iterate is returned
/// if it is positive.
#[allow(non_snake_case)]
pub fn invert_call_price(market_price: f64, S: f64, K: f64, T: f64, r: f64) -> Option<f64> {
    let intrinsic_bound = (S - K * (-r * T).exp()).max(0.0);
    if market_price <= intrinsic_bound {
        return None;
    }

    let mut sigma = INITIAL_VOL;
    for _ in 0..MAX_ITERATIONS {
        let price = bs_call_price(S, K, T, r, sigma);
        let vega = bs_vega(S, K, T, r, sigma);
        if vega.abs() < VEGA_FLOOR {
            return None;
        }
        let residual = market_price - price;
        if residual.abs() < PRICE_TOLERANCE {
            return Some(sigma);
        }
        sigma += residual / vega;
        if sigma <= 0.0 {
            return None;
        }
    }

    if sigma > 0.0 {
        Some(sigma)
    } else {
        None
    }
}
