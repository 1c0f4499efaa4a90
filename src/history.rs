use tracing::debug;

use crate::config::{HISTORY_MAX_POINTS, HISTORY_MIN_POINTS};
use crate::types::PriceChanges;

/// Reconstruct a short price history, oldest to newest, from the current price
/// and the provider's rolling percentage changes.
///
/// Each non-zero horizon is back-computed as `price / (1 + pct/100)` and pushed
/// onto the front in 1h, 6h, 24h order, which leaves the series chronological:
/// `[24h ago, 6h ago, 1h ago, now]`. The series is then padded by repeated
/// midpoint interpolation until it holds at least `HISTORY_MIN_POINTS`.
///
/// A missing (or non-positive) current price yields an empty series. With no
/// usable horizons the series is the single current price: interpolation needs
/// two points, so it is returned as-is rather than padded.
pub fn synthesize(current_price: Option<f64>, changes: &PriceChanges) -> Vec<f64> {
    let Some(current) = current_price.filter(|p| p.is_finite() && *p > 0.0) else {
        return Vec::new();
    };

    let mut prices = vec![current];
    for pct in [changes.h1, changes.h6, changes.h24].into_iter().flatten() {
        if pct == 0.0 {
            continue;
        }
        let past = current / (1.0 + pct / 100.0);
        if past.is_finite() {
            prices.insert(0, past);
        }
    }

    while prices.len() < HISTORY_MIN_POINTS {
        if prices.len() < 2 {
            debug!(len = prices.len(), "price history cannot be interpolated further");
            break;
        }
        prices = interpolate_midpoints(&prices);
        if prices.len() >= HISTORY_MAX_POINTS {
            break;
        }
    }

    prices.truncate(HISTORY_MAX_POINTS);
    prices
}

/// `[a, b, c]` becomes `[a, (a+b)/2, b, (b+c)/2, c]`.
fn interpolate_midpoints(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len() * 2);
    for pair in prices.windows(2) {
        out.push(pair[0]);
        out.push((pair[0] + pair[1]) / 2.0);
    }
    if let Some(last) = prices.last() {
        out.push(*last);
    }
    out
}
