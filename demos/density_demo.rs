//! Runs the full pipeline over a quote strip and prints the calibration
//! trace plus density summary statistics.
//!
//! ```text
//! cargo run --example density_demo                   # built-in synthetic strip
//! cargo run --example density_demo -- quotes.csv     # strike,mid rows from CSV
//! ```
//!
//! Set `RUST_LOG=debug` to see the stage transitions as they happen.

use density_lib::models::bs::bs_call_price;
use density_lib::models::utils::log_moneyness;
use density_lib::{
    run_pipeline, MarketSnapshot, PipelineConfig, Quote, SviParameters, SviSlice,
};

const SPOT: f64 = 100.0;
const RATE: f64 = 0.05;
const MATURITY: f64 = 0.25;

/// A symmetric smile priced into exact Black-Scholes mids, used when no CSV
/// path is given.
fn synthetic_quotes() -> anyhow::Result<Vec<Quote>> {
    let params = SviParameters::new(0.04, 0.10, 0.0, 0.0, 0.10)?;
    let slice = SviSlice::new(params, MATURITY);
    let forward = SPOT * (RATE * MATURITY).exp();

    let quotes = (0..9)
        .map(|i| {
            let strike = 80.0 + 5.0 * i as f64;
            let vol = slice.implied_vol(log_moneyness(strike, forward));
            Quote {
                strike,
                mid: bs_call_price(SPOT, strike, MATURITY, RATE, vol),
            }
        })
        .collect();
    Ok(quotes)
}

fn load_quotes(path: &str) -> anyhow::Result<Vec<Quote>> {
    let mut reader = csv::Reader::from_path(path)?;
    let quotes = reader.deserialize().collect::<Result<Vec<Quote>, _>>()?;
    Ok(quotes)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let quotes = match std::env::args().nth(1) {
        Some(path) => load_quotes(&path)?,
        None => synthetic_quotes()?,
    };
    println!("Running density pipeline over {} quotes", quotes.len());

    let snapshot = MarketSnapshot {
        quotes,
        spot: SPOT,
        rate: RATE,
        maturity: MATURITY,
    };
    let result = run_pipeline(&snapshot, PipelineConfig::default())?;

    println!("\nCalibration trace:");
    for line in result.trace.lines() {
        println!("  {}", line);
    }

    if let Some(summary) = result.density.summary() {
        println!("\nDensity summary:");
        println!("  peak strike: {:.2}", summary.peak_strike);
        println!("  mean:        {:.2}", summary.mean);
        println!("  std dev:     {:.2}", summary.std_dev);
        println!("  5%-95%:      [{:.2}, {:.2}]", summary.p05, summary.p95);
        println!("  integral:    {:.4}", summary.integral);
    }

    if let Some(smile) = result.smile_summary(snapshot.spot) {
        println!("\nSmile summary:");
        println!("  ATM vol: {:.4}", smile.atm_vol);
        println!("  range:   [{:.4}, {:.4}]", smile.min_vol, smile.max_vol);
        if let Some(skew) = smile.put_call_skew {
            println!("  skew:    {:.4}", skew);
        }
    }
    Ok(())
}
