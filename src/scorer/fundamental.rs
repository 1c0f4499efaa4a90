use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BASE_SCORE;
use crate::clock;
use crate::config::{liquidity_thresholds, volume_thresholds};
use crate::report::format_grouped;
use crate::types::{
    clamp_score, round_to, CreationStamp, LiquidityRating, MarketSnapshot, MaturityRating,
    SecondaryMetrics, Signal, VolumeRating,
};

/// Turnover inside this band is read as healthy trading.
const HEALTHY_TURNOVER: std::ops::RangeInclusive<f64> = 0.1..=2.0;
/// Above this, volume outruns liquidity enough to suggest wash trading.
const WASH_TRADING_TURNOVER: f64 = 5.0;
const DORMANT_TURNOVER: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalResult {
    pub liquidity_usd: f64,
    pub liquidity_rating: LiquidityRating,
    pub volume_24h: f64,
    pub volume_rating: VolumeRating,
    /// Only set when liquidity is positive.
    pub volume_to_liquidity_ratio: Option<f64>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
    pub fdv_to_mcap_ratio: Option<f64>,
    /// `None` when no creation time was reported; `Some(0)` when it could not be read.
    pub token_age_days: Option<u64>,
    pub maturity_rating: Option<MaturityRating>,
    pub total_pools: usize,
    /// Distinct venue ids, sorted.
    pub dex_listings: Vec<String>,
    pub telegram_members: Option<u64>,
    pub total_supply: Option<f64>,
    pub score: f64,
    pub signal: Signal,
    pub summary: String,
}

pub fn analyze(snapshot: &MarketSnapshot, secondary: Option<&SecondaryMetrics>) -> FundamentalResult {
    analyze_at(snapshot, secondary, clock::now_secs())
}

/// Same as [`analyze`] with an explicit "now" (Unix seconds) for the age calculation.
pub fn analyze_at(
    snapshot: &MarketSnapshot,
    secondary: Option<&SecondaryMetrics>,
    now_secs: f64,
) -> FundamentalResult {
    let liquidity_usd = snapshot.liquidity_usd.unwrap_or(0.0);
    let volume_24h = snapshot.volumes.h24.unwrap_or(0.0);
    let liquidity_rating = rate_liquidity(liquidity_usd);
    let volume_rating = rate_volume(volume_24h);

    let volume_to_liquidity_ratio = (liquidity_usd > 0.0).then(|| volume_24h / liquidity_usd);
    let fdv_to_mcap_ratio = match (snapshot.fdv, snapshot.market_cap) {
        (Some(fdv), Some(mcap)) if fdv != 0.0 && mcap > 0.0 => Some(fdv / mcap),
        _ => None,
    };

    let token_age_days = snapshot
        .pair_created_at
        .as_ref()
        .filter(|stamp| is_supplied(stamp))
        .map(|stamp| age_days(stamp, now_secs));
    let maturity_rating = token_age_days.map(rate_maturity);

    let dex_listings: Vec<String> = snapshot
        .pools
        .iter()
        .map(|pool| pool.dex_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let total_pools = snapshot.pools.len();

    let score = fundamental_score(
        liquidity_rating,
        volume_rating,
        volume_to_liquidity_ratio,
        maturity_rating,
        total_pools,
    );

    let mut result = FundamentalResult {
        liquidity_usd,
        liquidity_rating,
        volume_24h,
        volume_rating,
        volume_to_liquidity_ratio,
        fdv: snapshot.fdv,
        market_cap: snapshot.market_cap,
        fdv_to_mcap_ratio,
        token_age_days,
        maturity_rating,
        total_pools,
        dex_listings,
        telegram_members: secondary.and_then(|s| s.telegram_members),
        total_supply: secondary.and_then(|s| s.total_supply),
        score,
        signal: Signal::from_score(score),
        summary: String::new(),
    };
    result.summary = summarize(&result);

    debug!(
        score = result.score,
        signal = %result.signal,
        liquidity = %result.liquidity_rating,
        "fundamental score"
    );
    result
}

pub fn rate_liquidity(liquidity_usd: f64) -> LiquidityRating {
    if liquidity_usd >= liquidity_thresholds::EXCELLENT {
        LiquidityRating::Excellent
    } else if liquidity_usd >= liquidity_thresholds::GOOD {
        LiquidityRating::Good
    } else if liquidity_usd >= liquidity_thresholds::MODERATE {
        LiquidityRating::Moderate
    } else if liquidity_usd >= liquidity_thresholds::LOW {
        LiquidityRating::Low
    } else {
        LiquidityRating::VeryLow
    }
}

pub fn rate_volume(volume_usd: f64) -> VolumeRating {
    if volume_usd >= volume_thresholds::HIGH {
        VolumeRating::High
    } else if volume_usd >= volume_thresholds::MODERATE {
        VolumeRating::Moderate
    } else {
        VolumeRating::Low
    }
}

pub fn rate_maturity(age_days: u64) -> MaturityRating {
    match age_days {
        365.. => MaturityRating::Mature,
        90.. => MaturityRating::Established,
        30.. => MaturityRating::Young,
        _ => MaturityRating::New,
    }
}

/// A zero epoch or empty string counts as "not reported", same as a missing field.
fn is_supplied(stamp: &CreationStamp) -> bool {
    match stamp {
        CreationStamp::EpochMillis(ms) => *ms != 0.0,
        CreationStamp::Text(s) => !s.trim().is_empty(),
    }
}

/// Whole days between the stamp and `now_secs`, floored at 0. Unreadable stamps age 0.
fn age_days(stamp: &CreationStamp, now_secs: f64) -> u64 {
    match clock::stamp_to_unix_secs(stamp) {
        Some(created) => ((now_secs - created) / 86_400.0).floor().max(0.0) as u64,
        None => {
            debug!(?stamp, "unreadable pool creation time");
            0
        }
    }
}

fn fundamental_score(
    liquidity: LiquidityRating,
    volume: VolumeRating,
    turnover: Option<f64>,
    maturity: Option<MaturityRating>,
    total_pools: usize,
) -> f64 {
    let mut score = BASE_SCORE;

    score += match liquidity {
        LiquidityRating::Excellent => 20.0,
        LiquidityRating::Good => 10.0,
        LiquidityRating::Moderate => 0.0,
        LiquidityRating::Low => -10.0,
        LiquidityRating::VeryLow => -20.0,
    };

    score += match volume {
        VolumeRating::High => 15.0,
        VolumeRating::Moderate => 5.0,
        VolumeRating::Low => -10.0,
    };

    if let Some(ratio) = turnover {
        if HEALTHY_TURNOVER.contains(&ratio) {
            score += 5.0;
        } else if ratio > WASH_TRADING_TURNOVER || ratio < DORMANT_TURNOVER {
            score -= 5.0;
        }
    }

    score += match maturity {
        Some(MaturityRating::Mature) => 10.0,
        Some(MaturityRating::Established) => 5.0,
        Some(MaturityRating::New) => -5.0,
        Some(MaturityRating::Young) | None => 0.0,
    };

    score += match total_pools {
        5.. => 10.0,
        3.. => 5.0,
        2 => 2.0,
        _ => 0.0,
    };

    round_to(clamp_score(score), 1)
}

fn summarize(result: &FundamentalResult) -> String {
    let mut points = Vec::new();

    if result.liquidity_usd > 0.0 {
        points.push(format!(
            "Liquidity ${} ({})",
            format_grouped(result.liquidity_usd),
            result.liquidity_rating
        ));
    }
    if result.volume_24h > 0.0 {
        points.push(format!(
            "24h volume ${} ({})",
            format_grouped(result.volume_24h),
            result.volume_rating
        ));
    }
    if let Some(maturity) = result.maturity_rating {
        let age = match result.token_age_days {
            Some(days) if days > 0 => format!("{days} days"),
            _ => "unknown".to_string(),
        };
        points.push(format!("Token age: {age} ({maturity})"));
    }
    if result.total_pools > 0 {
        points.push(format!(
            "Listed on {} pools across {} DEXs",
            result.total_pools,
            result.dex_listings.len()
        ));
    }
    if let Some(fdv) = result.fdv.filter(|v| *v != 0.0) {
        points.push(format!("FDV ${}", format_grouped(fdv)));
    }

    if points.is_empty() {
        "Insufficient data for fundamental analysis".to_string()
    } else {
        points.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PoolListing, VolumeWindows};

    // 2024-06-01T00:00:00Z
    const NOW: f64 = 1_717_200_000.0;

    fn pool(dex: &str) -> PoolListing {
        PoolListing {
            dex_id: dex.to_string(),
            pair_address: None,
        }
    }

    fn snapshot(liquidity: Option<f64>, volume: Option<f64>) -> MarketSnapshot {
        MarketSnapshot {
            contract_address: "TokenMint111111111111111111111111111111111".to_string(),
            price_usd: 1.0,
            liquidity_usd: liquidity,
            volumes: VolumeWindows {
                h24: volume,
                ..VolumeWindows::default()
            },
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn deep_liquid_old_token_scores_high() {
        let snap = MarketSnapshot {
            fdv: Some(10_000_000.0),
            market_cap: Some(5_000_000.0),
            pair_created_at: Some(CreationStamp::Text("2021-03-15T08:00:00Z".to_string())),
            pools: vec![pool("raydium"), pool("orca")],
            ..snapshot(Some(1_500_000.0), Some(500_000.0))
        };
        let result = analyze_at(&snap, None, NOW);

        assert_eq!(result.liquidity_rating, LiquidityRating::Excellent);
        assert_eq!(result.volume_rating, VolumeRating::High);
        assert_eq!(result.maturity_rating, Some(MaturityRating::Mature));
        assert_eq!(result.fdv_to_mcap_ratio, Some(2.0));
        assert_eq!(result.dex_listings, vec!["orca".to_string(), "raydium".to_string()]);
        assert!(result.score > 50.0);
        // 50 + 20 + 15 + 5 + 10 + 2 clamps to 100
        assert_eq!(result.score, 100.0);
        assert_eq!(result.signal, Signal::Bullish);
    }

    #[test]
    fn thin_token_scores_low() {
        let result = analyze_at(&snapshot(Some(500.0), Some(100.0)), None, NOW);
        assert_eq!(result.liquidity_rating, LiquidityRating::VeryLow);
        assert_eq!(result.volume_rating, VolumeRating::Low);
        assert!(result.score < 50.0);
        // 50 - 20 - 10 + 5 (ratio 0.2)
        assert_eq!(result.score, 25.0);
        assert_eq!(result.signal, Signal::Bearish);
    }

    #[test]
    fn absent_liquidity_counts_as_zero_without_ratio() {
        let result = analyze_at(&snapshot(None, Some(50_000.0)), None, NOW);
        assert_eq!(result.liquidity_usd, 0.0);
        assert!(result.volume_to_liquidity_ratio.is_none());
        // 50 - 20 + 5
        assert_eq!(result.score, 35.0);
    }

    #[test]
    fn missing_and_unreadable_timestamps_differ() {
        let missing = analyze_at(&snapshot(Some(10_000.0), None), None, NOW);
        assert_eq!(missing.token_age_days, None);
        assert_eq!(missing.maturity_rating, None);

        let garbage = MarketSnapshot {
            pair_created_at: Some(CreationStamp::Text("last tuesday".to_string())),
            ..snapshot(Some(10_000.0), None)
        };
        let unreadable = analyze_at(&garbage, None, NOW);
        assert_eq!(unreadable.token_age_days, Some(0));
        assert_eq!(unreadable.maturity_rating, Some(MaturityRating::New));
        assert_eq!(unreadable.score, missing.score - 5.0);

        let impossible = MarketSnapshot {
            pair_created_at: Some(CreationStamp::Text("2024-02-31T00:00:00Z".to_string())),
            ..snapshot(Some(10_000.0), None)
        };
        let impossible = analyze_at(&impossible, None, NOW);
        assert_eq!(impossible.token_age_days, Some(0));
        assert_eq!(impossible.maturity_rating, Some(MaturityRating::New));

        let zero = MarketSnapshot {
            pair_created_at: Some(CreationStamp::EpochMillis(0.0)),
            ..snapshot(Some(10_000.0), None)
        };
        assert_eq!(analyze_at(&zero, None, NOW).maturity_rating, None);
    }

    #[test]
    fn epoch_millis_age() {
        let created_ms = (NOW - 100.0 * 86_400.0) * 1000.0;
        let snap = MarketSnapshot {
            pair_created_at: Some(CreationStamp::EpochMillis(created_ms)),
            ..snapshot(None, None)
        };
        let result = analyze_at(&snap, None, NOW);
        assert_eq!(result.token_age_days, Some(100));
        assert_eq!(result.maturity_rating, Some(MaturityRating::Established));

        // Stamps in the future clamp to age 0.
        let future = MarketSnapshot {
            pair_created_at: Some(CreationStamp::EpochMillis((NOW + 86_400.0) * 1000.0)),
            ..snapshot(None, None)
        };
        assert_eq!(analyze_at(&future, None, NOW).token_age_days, Some(0));
    }

    #[test]
    fn rating_ladders_are_inclusive_at_thresholds() {
        assert_eq!(rate_liquidity(1_000_000.0), LiquidityRating::Excellent);
        assert_eq!(rate_liquidity(999_999.0), LiquidityRating::Good);
        assert_eq!(rate_liquidity(10_000.0), LiquidityRating::Moderate);
        assert_eq!(rate_liquidity(1_000.0), LiquidityRating::Low);
        assert_eq!(rate_liquidity(999.0), LiquidityRating::VeryLow);
        assert_eq!(rate_volume(10_000.0), VolumeRating::Moderate);
        assert_eq!(rate_maturity(365), MaturityRating::Mature);
        assert_eq!(rate_maturity(90), MaturityRating::Established);
        assert_eq!(rate_maturity(30), MaturityRating::Young);
        assert_eq!(rate_maturity(29), MaturityRating::New);
    }

    #[test]
    fn pool_count_drives_venue_bonus() {
        let base = analyze_at(&snapshot(Some(10_000.0), Some(10_000.0)), None, NOW).score;
        let with_pools = |n: usize| MarketSnapshot {
            pools: (0..n).map(|_| pool("raydium")).collect(),
            ..snapshot(Some(10_000.0), Some(10_000.0))
        };
        assert_eq!(analyze_at(&with_pools(2), None, NOW).score, base + 2.0);
        assert_eq!(analyze_at(&with_pools(3), None, NOW).score, base + 5.0);
        let five = analyze_at(&with_pools(5), None, NOW);
        assert_eq!(five.score, base + 10.0);
        assert_eq!(five.dex_listings, vec!["raydium".to_string()]);
    }

    #[test]
    fn turnover_extremes_are_penalised() {
        let wash = analyze_at(&snapshot(Some(10_000.0), Some(60_000.0)), None, NOW);
        let dormant = analyze_at(&snapshot(Some(2_000_000.0), Some(10_000.0)), None, NOW);
        // 50 + 0 + 5 - 5
        assert_eq!(wash.score, 50.0);
        // 50 + 20 + 5 - 5
        assert_eq!(dormant.score, 70.0);
    }

    #[test]
    fn secondary_metrics_are_carried() {
        let secondary = SecondaryMetrics {
            telegram_members: Some(4_200),
            total_supply: Some(1e9),
            ..SecondaryMetrics::default()
        };
        let result = analyze_at(&snapshot(None, None), Some(&secondary), NOW);
        assert_eq!(result.telegram_members, Some(4_200));
        assert_eq!(result.total_supply, Some(1e9));
    }

    #[test]
    fn summary_mentions_liquidity_and_pools() {
        let snap = MarketSnapshot {
            pools: vec![pool("raydium"), pool("orca"), pool("raydium")],
            ..snapshot(Some(1_234_567.0), None)
        };
        let summary = analyze_at(&snap, None, NOW).summary;
        assert!(summary.contains("Liquidity $1,234,567 (excellent)"));
        assert!(summary.contains("Listed on 3 pools across 2 DEXs"));

        let empty = analyze_at(&snapshot(None, None), None, NOW);
        assert_eq!(empty.summary, "Insufficient data for fundamental analysis");
    }
}
