use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{mean, tail, BASE_SCORE};
use crate::types::{
    clamp_score, round_to, BandPosition, MacdTrend, PriceChanges, RsiSignal, Signal,
    TrendDirection, VolumeTrend,
};

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEVS: f64 = 2.0;
/// Volume series shorter than this produce no volume indicators.
pub const VOLUME_MIN_POINTS: usize = 20;
/// Support/resistance needs at least this many prices.
pub const LEVELS_MIN_POINTS: usize = 10;

/// The signal line is approximated from the MACD line itself; a short,
/// partly synthetic series cannot support a real 9-period EMA of MACD.
const MACD_SIGNAL_FACTOR: f64 = 0.9;

const INSUFFICIENT_DATA: &str = "Insufficient price data for technical analysis";

/// Indicator readings and the derived 0-100 technical score. Every indicator is
/// `None` when the series is too short for its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalResult {
    pub rsi_14: Option<f64>,
    pub rsi_signal: Option<RsiSignal>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub macd_trend: Option<MacdTrend>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_position: Option<BandPosition>,
    pub volume_ma_20: Option<f64>,
    pub volume_trend: Option<VolumeTrend>,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
    pub trend_direction: Option<TrendDirection>,
    pub score: f64,
    pub signal: Signal,
    pub summary: String,
}

impl Default for TechnicalResult {
    fn default() -> Self {
        Self {
            rsi_14: None,
            rsi_signal: None,
            sma_20: None,
            sma_50: None,
            ema_12: None,
            ema_26: None,
            macd_line: None,
            macd_signal: None,
            macd_histogram: None,
            macd_trend: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            bb_position: None,
            volume_ma_20: None,
            volume_trend: None,
            support_level: None,
            resistance_level: None,
            trend_direction: None,
            score: BASE_SCORE,
            signal: Signal::Neutral,
            summary: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Run the indicator pipeline over `prices` (oldest first).
///
/// Fewer than two prices yields the default result with only the
/// insufficient-data summary set.
pub fn analyze(
    prices: &[f64],
    volumes: Option<&[f64]>,
    current_price: Option<f64>,
    price_changes: Option<&PriceChanges>,
) -> TechnicalResult {
    if prices.len() < 2 {
        return TechnicalResult {
            summary: INSUFFICIENT_DATA.to_string(),
            ..TechnicalResult::default()
        };
    }

    let len = prices.len();

    let rsi_14 = (len >= RSI_PERIOD).then(|| rsi(prices, RSI_PERIOD));
    let sma_20 = (len >= SMA_SHORT).then(|| sma(prices, SMA_SHORT));
    let sma_50 = (len >= SMA_LONG).then(|| sma(prices, SMA_LONG));
    let ema_12 = (len >= EMA_FAST).then(|| ema(prices, EMA_FAST));
    let ema_26 = (len >= EMA_SLOW).then(|| ema(prices, EMA_SLOW));
    let macd = (len >= EMA_SLOW).then(|| macd(prices));
    let bands = (len >= BOLLINGER_PERIOD).then(|| bollinger(prices, BOLLINGER_PERIOD, BOLLINGER_STD_DEVS));
    let bb_position = match (bands, current_price.filter(|p| *p != 0.0)) {
        (Some(b), Some(price)) => Some(band_position(price, &b)),
        _ => None,
    };

    let volumes = volumes.filter(|v| v.len() >= VOLUME_MIN_POINTS);
    let volume_ma_20 = volumes.map(|v| sma(v, SMA_SHORT));
    let volume_trend = volumes.map(volume_trend);

    let (support_level, resistance_level) = if len >= LEVELS_MIN_POINTS {
        let (support, resistance) = support_resistance(prices);
        (Some(support), Some(resistance))
    } else {
        (None, None)
    };

    let rsi_signal = rsi_14.map(interpret_rsi);
    let macd_trend = macd.map(|m| interpret_macd(&m));
    let trend = trend_direction(prices, price_changes);

    let score = technical_score(
        rsi_14,
        macd_trend,
        trend,
        bb_position,
        volume_trend,
        price_changes,
    );

    let mut result = TechnicalResult {
        rsi_14,
        rsi_signal,
        sma_20,
        sma_50,
        ema_12,
        ema_26,
        macd_line: macd.map(|m| m.line),
        macd_signal: macd.map(|m| m.signal),
        macd_histogram: macd.map(|m| m.histogram),
        macd_trend,
        bb_upper: bands.map(|b| b.upper),
        bb_middle: bands.map(|b| b.middle),
        bb_lower: bands.map(|b| b.lower),
        bb_position,
        volume_ma_20,
        volume_trend,
        support_level,
        resistance_level,
        trend_direction: Some(trend),
        score,
        signal: Signal::from_score(score),
        summary: String::new(),
    };
    result.summary = summarize(&result);

    debug!(score = result.score, signal = %result.signal, points = len, "technical score");
    result
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Simple-average RSI over the last `period` deltas, rounded to 2 decimals.
/// A window with no losses reads 100.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let window = tail(&deltas, period);

    let avg_gain = mean(&window.iter().map(|d| d.max(0.0)).collect::<Vec<_>>());
    let avg_loss = mean(&window.iter().map(|d| (-d).max(0.0)).collect::<Vec<_>>());

    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    round_to(100.0 - 100.0 / (1.0 + rs), 2)
}

pub fn sma(values: &[f64], period: usize) -> f64 {
    mean(tail(values, period))
}

/// Seeded with the first element, smoothed left to right.
pub fn ema(values: &[f64], period: usize) -> f64 {
    let k = 2.0 / (period as f64 + 1.0);
    let Some((first, rest)) = values.split_first() else {
        return 0.0;
    };
    rest.iter().fold(*first, |ema, price| (price - ema) * k + ema)
}

pub fn macd(prices: &[f64]) -> Macd {
    let line = ema(prices, EMA_FAST) - ema(prices, EMA_SLOW);
    let signal = line * MACD_SIGNAL_FACTOR;
    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

/// Middle is the trailing SMA; the bands sit `std_devs` population standard
/// deviations of the same window either side.
pub fn bollinger(prices: &[f64], period: usize, std_devs: f64) -> Bands {
    let window = tail(prices, period);
    let middle = mean(window);
    let variance = mean(&window.iter().map(|p| (p - middle).powi(2)).collect::<Vec<_>>());
    let width = std_devs * variance.sqrt();
    Bands {
        upper: middle + width,
        middle,
        lower: middle - width,
    }
}

/// Outer bands are checked before the "near" zones, which start halfway
/// between the middle and each outer band.
pub fn band_position(price: f64, bands: &Bands) -> BandPosition {
    let near_upper = bands.middle + (bands.upper - bands.middle) * 0.5;
    let near_lower = bands.middle - (bands.middle - bands.lower) * 0.5;

    if price > bands.upper {
        BandPosition::AboveUpper
    } else if price > near_upper {
        BandPosition::NearUpper
    } else if price < bands.lower {
        BandPosition::BelowLower
    } else if price < near_lower {
        BandPosition::NearLower
    } else {
        BandPosition::Middle
    }
}

/// Last 5 points against the 15 before them.
pub fn volume_trend(volumes: &[f64]) -> VolumeTrend {
    let split = volumes.len().saturating_sub(5);
    let recent = mean(&volumes[split..]);
    let older_start = volumes.len().saturating_sub(VOLUME_MIN_POINTS);
    let older = mean(&volumes[older_start..split]);

    if recent > older * 1.2 {
        VolumeTrend::Increasing
    } else if recent < older * 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

/// (min, max) of the trailing 20 prices.
pub fn support_resistance(prices: &[f64]) -> (f64, f64) {
    tail(prices, SMA_SHORT)
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(*p), hi.max(*p)))
}

/// Provider changes decide first when their weighted blend clears +/-5%;
/// otherwise the last five prices are compared with the five before them.
pub fn trend_direction(prices: &[f64], price_changes: Option<&PriceChanges>) -> TrendDirection {
    if let Some(changes) = price_changes {
        let weighted = changes.blend(0.4, 0.35, 0.25);
        if weighted > 5.0 {
            return TrendDirection::Uptrend;
        }
        if weighted < -5.0 {
            return TrendDirection::Downtrend;
        }
    }

    if prices.len() >= 10 {
        let n = prices.len();
        let recent = mean(&prices[n - 5..]);
        let older = mean(&prices[n - 10..n - 5]);
        if recent > older * 1.05 {
            return TrendDirection::Uptrend;
        }
        if recent < older * 0.95 {
            return TrendDirection::Downtrend;
        }
    }

    TrendDirection::Sideways
}

pub fn interpret_rsi(rsi: f64) -> RsiSignal {
    if rsi >= 70.0 {
        RsiSignal::Overbought
    } else if rsi <= 30.0 {
        RsiSignal::Oversold
    } else {
        RsiSignal::Neutral
    }
}

pub fn interpret_macd(macd: &Macd) -> MacdTrend {
    if macd.line > macd.signal && macd.histogram > 0.0 {
        MacdTrend::Bullish
    } else if macd.line < macd.signal && macd.histogram < 0.0 {
        MacdTrend::Bearish
    } else {
        MacdTrend::Neutral
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

fn technical_score(
    rsi: Option<f64>,
    macd_trend: Option<MacdTrend>,
    trend: TrendDirection,
    bb_position: Option<BandPosition>,
    volume_trend: Option<VolumeTrend>,
    price_changes: Option<&PriceChanges>,
) -> f64 {
    let mut score = BASE_SCORE;

    // Oversold reads as a buying opportunity, overbought as exhaustion.
    if let Some(rsi) = rsi {
        score += if rsi < 30.0 {
            15.0
        } else if rsi > 70.0 {
            -15.0
        } else if rsi < 45.0 {
            5.0
        } else if rsi > 55.0 {
            -5.0
        } else {
            0.0
        };
    }

    score += match macd_trend {
        Some(MacdTrend::Bullish) => 15.0,
        Some(MacdTrend::Bearish) => -15.0,
        _ => 0.0,
    };

    score += match trend {
        TrendDirection::Uptrend => 10.0,
        TrendDirection::Downtrend => -10.0,
        TrendDirection::Sideways => 0.0,
    };

    score += match bb_position {
        Some(BandPosition::BelowLower) => 10.0,
        Some(BandPosition::NearLower) => 5.0,
        Some(BandPosition::NearUpper) => -5.0,
        Some(BandPosition::AboveUpper) => -10.0,
        _ => 0.0,
    };

    // Rising volume confirms whichever way the price is moving.
    if volume_trend == Some(VolumeTrend::Increasing) {
        score += match trend {
            TrendDirection::Uptrend => 5.0,
            TrendDirection::Downtrend => -5.0,
            TrendDirection::Sideways => 0.0,
        };
    }

    if let Some(h24) = price_changes.and_then(|c| c.h24) {
        if h24 > 10.0 {
            score += 5.0;
        } else if h24 < -10.0 {
            score -= 5.0;
        }
    }

    round_to(clamp_score(score), 1)
}

fn summarize(result: &TechnicalResult) -> String {
    let mut points = Vec::new();

    if let (Some(rsi), Some(signal)) = (result.rsi_14, result.rsi_signal) {
        points.push(format!("RSI at {rsi:.1} ({signal})"));
    }
    if let Some(trend) = result.macd_trend {
        points.push(format!("MACD showing {trend} momentum"));
    }
    if let Some(direction) = result.trend_direction {
        points.push(format!("Price in {direction}"));
    }
    if let Some(volume) = result.volume_trend {
        points.push(format!("Volume {volume}"));
    }
    if let Some(position) = result.bb_position {
        points.push(format!("Price {}", position.describe()));
    }

    if points.is_empty() {
        "Insufficient data for detailed analysis".to_string()
    } else {
        points.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (1..=n).rev().map(|i| i as f64).collect()
    }

    #[test]
    fn too_few_points_is_a_no_op() {
        let result = analyze(&[1.0], None, Some(1.0), None);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.signal, Signal::Neutral);
        assert!(result.rsi_14.is_none());
        assert!(result.trend_direction.is_none());
        assert_eq!(result.summary, INSUFFICIENT_DATA);

        let empty = analyze(&[], None, None, None);
        assert_eq!(empty.score, 50.0);
    }

    #[test]
    fn monotone_rise_is_uptrend_with_bullish_macd() {
        let prices = rising(30);
        let result = analyze(&prices, None, Some(30.0), None);

        assert_eq!(result.trend_direction, Some(TrendDirection::Uptrend));
        assert_eq!(result.macd_trend, Some(MacdTrend::Bullish));
        assert!(result.ema_12.unwrap() > result.ema_26.unwrap());
        assert_eq!(result.rsi_14, Some(100.0));
        assert_eq!(result.rsi_signal, Some(RsiSignal::Overbought));
        assert_eq!(result.bb_position, Some(BandPosition::NearUpper));
        // 50 - 15 (rsi) + 15 (macd) + 10 (trend) - 5 (near upper band)
        assert_eq!(result.score, 55.0);
        assert_eq!(result.signal, Signal::Neutral);
    }

    #[test]
    fn monotone_fall_mirrors_the_rise() {
        let prices = falling(30);
        let result = analyze(&prices, None, Some(1.0), None);

        assert_eq!(result.trend_direction, Some(TrendDirection::Downtrend));
        assert_eq!(result.macd_trend, Some(MacdTrend::Bearish));
        assert_eq!(result.rsi_14, Some(0.0));
        assert_eq!(result.rsi_signal, Some(RsiSignal::Oversold));
        assert_eq!(result.bb_position, Some(BandPosition::NearLower));
        // 50 + 15 (rsi oversold) - 15 (macd) - 10 (trend) + 5 (near lower band)
        assert_eq!(result.score, 45.0);
    }

    #[test]
    fn indicators_gate_on_series_length() {
        let result = analyze(&rising(15), None, Some(15.0), None);
        assert!(result.rsi_14.is_some());
        assert!(result.ema_12.is_some());
        assert!(result.sma_20.is_none());
        assert!(result.macd_line.is_none());
        assert!(result.bb_upper.is_none());
        assert!(result.bb_position.is_none());
        assert!(result.support_level.is_some());
        assert!(result.sma_50.is_none());

        let short = analyze(&rising(5), None, Some(5.0), None);
        assert!(short.support_level.is_none());
        assert_eq!(short.trend_direction, Some(TrendDirection::Sideways));
    }

    #[test]
    fn rsi_is_bounded_and_hits_100_without_losses() {
        assert_eq!(rsi(&rising(20), RSI_PERIOD), 100.0);
        let zigzag: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let value = rsi(&zigzag, RSI_PERIOD);
        assert!((0.0..=100.0).contains(&value));
        assert!((value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn ema_seeds_with_first_element() {
        assert_eq!(ema(&[4.0], 12), 4.0);
        // k = 2/3 for period 2: 1 -> (3-1)*2/3+1 = 2.333..
        assert!((ema(&[1.0, 3.0], 2) - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn macd_signal_is_scaled_line() {
        let m = macd(&rising(30));
        assert!((m.signal - m.line * 0.9).abs() < 1e-12);
        assert!((m.histogram - m.line * 0.1).abs() < 1e-12);
    }

    #[test]
    fn band_position_checks_outer_bands_first() {
        let bands = Bands { upper: 12.0, middle: 10.0, lower: 8.0 };
        assert_eq!(band_position(12.5, &bands), BandPosition::AboveUpper);
        assert_eq!(band_position(11.5, &bands), BandPosition::NearUpper);
        assert_eq!(band_position(11.0, &bands), BandPosition::Middle);
        assert_eq!(band_position(10.0, &bands), BandPosition::Middle);
        assert_eq!(band_position(8.5, &bands), BandPosition::NearLower);
        assert_eq!(band_position(7.0, &bands), BandPosition::BelowLower);
    }

    #[test]
    fn volume_trend_compares_recent_to_older_window() {
        let mut volumes = vec![100.0; 15];
        volumes.extend([150.0; 5]);
        assert_eq!(volume_trend(&volumes), VolumeTrend::Increasing);

        let mut fading = vec![100.0; 15];
        fading.extend([50.0; 5]);
        assert_eq!(volume_trend(&fading), VolumeTrend::Decreasing);

        assert_eq!(volume_trend(&[100.0; 20]), VolumeTrend::Stable);
    }

    #[test]
    fn rising_volume_confirms_uptrend() {
        let prices = rising(30);
        let mut volumes = vec![100.0; 15];
        volumes.extend([150.0; 5]);
        let with_volume = analyze(&prices, Some(&volumes), Some(30.0), None);
        assert_eq!(with_volume.volume_trend, Some(VolumeTrend::Increasing));
        assert_eq!(with_volume.volume_ma_20, Some(112.5));
        assert_eq!(with_volume.score, 60.0);

        // Too short a volume series is ignored.
        let short = analyze(&prices, Some(&volumes[..10]), Some(30.0), None);
        assert!(short.volume_trend.is_none());
        assert_eq!(short.score, 55.0);
    }

    #[test]
    fn provider_changes_drive_trend_and_24h_bonus() {
        let flat = vec![1.0; 30];
        let pumping = PriceChanges { h1: Some(8.0), h6: Some(6.0), h24: Some(12.0) };
        let result = analyze(&flat, None, Some(1.0), Some(&pumping));
        assert_eq!(result.trend_direction, Some(TrendDirection::Uptrend));
        // flat series: rsi 100 (no losses) -15, macd neutral, +10 trend, middle band, +5 for h24 > 10
        assert_eq!(result.score, 50.0);

        // Blend inside +/-5 falls back to the series.
        let mild = PriceChanges { h1: Some(1.0), h6: Some(1.0), h24: Some(-1.0) };
        assert_eq!(
            trend_direction(&rising(30), Some(&mild)),
            TrendDirection::Uptrend
        );
        assert_eq!(trend_direction(&flat, Some(&mild)), TrendDirection::Sideways);
    }

    #[test]
    fn every_bullish_rule_at_once_clamps_to_100() {
        // Long rally, then a short pullback: RSI 0 while the EMAs still point up.
        let mut prices: Vec<f64> = (0..30).map(|i| i as f64 * 10.0).collect();
        for step in 1..=14 {
            prices.push(290.0 - step as f64 * 0.5);
        }
        let mut volumes = vec![100.0; 15];
        volumes.extend([150.0; 5]);
        let pumping = PriceChanges { h1: Some(20.0), h6: Some(20.0), h24: Some(20.0) };

        let result = analyze(&prices, Some(&volumes), Some(1.0), Some(&pumping));
        assert_eq!(result.rsi_14, Some(0.0));
        assert_eq!(result.macd_trend, Some(MacdTrend::Bullish));
        assert_eq!(result.trend_direction, Some(TrendDirection::Uptrend));
        assert_eq!(result.bb_position, Some(BandPosition::BelowLower));
        assert_eq!(result.volume_trend, Some(VolumeTrend::Increasing));
        // 50 + 15 + 15 + 10 + 10 + 5 + 5 = 110 before clamping
        assert_eq!(result.score, 100.0);
        assert_eq!(result.signal, Signal::Bullish);
    }

    #[test]
    fn every_bearish_rule_at_once_clamps_to_0() {
        // Mirror image: long slide, short bounce, dumping changes.
        let mut prices: Vec<f64> = (0..30).map(|i| 1_000.0 - i as f64 * 10.0).collect();
        for step in 1..=14 {
            prices.push(710.0 + step as f64 * 0.5);
        }
        let mut volumes = vec![100.0; 15];
        volumes.extend([150.0; 5]);
        let dumping = PriceChanges { h1: Some(-20.0), h6: Some(-20.0), h24: Some(-20.0) };

        let result = analyze(&prices, Some(&volumes), Some(5_000.0), Some(&dumping));
        assert_eq!(result.rsi_14, Some(100.0));
        assert_eq!(result.macd_trend, Some(MacdTrend::Bearish));
        assert_eq!(result.trend_direction, Some(TrendDirection::Downtrend));
        assert_eq!(result.bb_position, Some(BandPosition::AboveUpper));
        // 50 - 15 - 15 - 10 - 10 - 5 - 5 = -10 before clamping
        assert_eq!(result.score, 0.0);
        assert_eq!(result.signal, Signal::Bearish);
    }

    #[test]
    fn support_and_resistance_use_trailing_window() {
        let prices = rising(30);
        assert_eq!(support_resistance(&prices), (11.0, 30.0));
    }

    #[test]
    fn summary_lists_readings() {
        let result = analyze(&rising(30), None, Some(30.0), None);
        assert!(result.summary.starts_with("RSI at 100.0 (overbought)"));
        assert!(result.summary.contains("MACD showing bullish momentum"));
        assert!(result.summary.contains("Price in uptrend"));
    }
}
