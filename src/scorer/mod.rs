//! The three independent component scorers. Each is a pure function of an
//! already-fetched snapshot and returns a fully-populated result record.

pub mod fundamental;
pub mod sentiment;
pub mod technical;

pub use fundamental::FundamentalResult;
pub use sentiment::SentimentResult;
pub use technical::TechnicalResult;

/// Neutral starting point for every component score.
pub const BASE_SCORE: f64 = 50.0;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Trailing `n` elements (or the whole slice when shorter).
fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}
