use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::config::signal_thresholds;

// ---------------------------------------------------------------------------
// Market snapshot (primary provider)
// ---------------------------------------------------------------------------

/// Percentage price changes over the provider's rolling windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChanges {
    pub h1: Option<f64>,
    pub h6: Option<f64>,
    pub h24: Option<f64>,
}

impl PriceChanges {
    /// Weighted blend of the three horizons; absent horizons count as 0.
    pub fn blend(&self, w1: f64, w6: f64, w24: f64) -> f64 {
        self.h1.unwrap_or(0.0) * w1 + self.h6.unwrap_or(0.0) * w6 + self.h24.unwrap_or(0.0) * w24
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeWindows {
    pub h1: Option<f64>,
    pub h6: Option<f64>,
    pub h24: Option<f64>,
}

/// 24h buy/sell transaction counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCounts {
    pub buys: u64,
    pub sells: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
}

impl SocialLinks {
    /// Community channels that count towards activity: twitter, telegram, discord.
    /// A website alone is not a community channel.
    pub fn channel_count(&self) -> usize {
        [&self.twitter, &self.telegram, &self.discord]
            .iter()
            .filter(|link| link.as_deref().is_some_and(|s| !s.is_empty()))
            .count()
    }
}

/// One pool/pair the asset trades in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolListing {
    pub dex_id: String,
    pub pair_address: Option<String>,
}

/// Pool creation time as reported upstream: epoch milliseconds or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreationStamp {
    EpochMillis(f64),
    Text(String),
}

/// Point-in-time market telemetry for one asset. Every numeric field except the
/// current price is optional; absence is not the same as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub contract_address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: f64,
    pub price_changes: PriceChanges,
    pub volumes: VolumeWindows,
    pub liquidity_usd: Option<f64>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
    pub pair_created_at: Option<CreationStamp>,
    pub dex_name: Option<String>,
    pub pair_address: Option<String>,
    pub pools: Vec<PoolListing>,
    pub txns_24h: Option<TxnCounts>,
    pub socials: SocialLinks,
}

// ---------------------------------------------------------------------------
// Secondary metrics (metadata provider)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryMetrics {
    pub sentiment_votes_up_pct: Option<f64>,
    pub sentiment_votes_down_pct: Option<f64>,
    /// 0–10 scale upstream.
    pub community_score: Option<f64>,
    /// 0–10 scale upstream.
    pub public_interest_score: Option<f64>,
    pub twitter_followers: Option<u64>,
    pub telegram_members: Option<u64>,
    pub total_supply: Option<f64>,
    pub market_cap_rank: Option<u32>,
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Bullish,
    Neutral,
    Bearish,
}

impl Signal {
    pub fn from_score(score: f64) -> Self {
        if score >= signal_thresholds::BULLISH_MIN {
            Signal::Bullish
        } else if score <= signal_thresholds::BEARISH_MAX {
            Signal::Bearish
        } else {
            Signal::Neutral
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Bullish => "BULLISH",
            Signal::Neutral => "NEUTRAL",
            Signal::Bearish => "BEARISH",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    Overbought,
    Neutral,
    Oversold,
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RsiSignal::Overbought => "overbought",
            RsiSignal::Neutral => "neutral",
            RsiSignal::Oversold => "oversold",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdTrend {
    Bullish,
    Neutral,
    Bearish,
}

impl std::fmt::Display for MacdTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MacdTrend::Bullish => "bullish",
            MacdTrend::Neutral => "neutral",
            MacdTrend::Bearish => "bearish",
        };
        write!(f, "{s}")
    }
}

/// Where the current price sits relative to the Bollinger bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    NearUpper,
    Middle,
    NearLower,
    BelowLower,
}

impl BandPosition {
    pub fn describe(&self) -> &'static str {
        match self {
            BandPosition::AboveUpper => "above the upper band (overbought zone)",
            BandPosition::NearUpper => "close to the upper band",
            BandPosition::Middle => "around the middle band",
            BandPosition::NearLower => "close to the lower band",
            BandPosition::BelowLower => "below the lower band (oversold zone)",
        }
    }
}

impl std::fmt::Display for BandPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BandPosition::AboveUpper => "above_upper",
            BandPosition::NearUpper => "near_upper",
            BandPosition::Middle => "middle",
            BandPosition::NearLower => "near_lower",
            BandPosition::BelowLower => "below_lower",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl std::fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VolumeTrend::Increasing => "increasing",
            VolumeTrend::Stable => "stable",
            VolumeTrend::Decreasing => "decreasing",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Uptrend,
    Sideways,
    Downtrend,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrendDirection::Uptrend => "uptrend",
            TrendDirection::Sideways => "sideways",
            TrendDirection::Downtrend => "downtrend",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityRating {
    Excellent,
    Good,
    Moderate,
    Low,
    VeryLow,
}

impl std::fmt::Display for LiquidityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LiquidityRating::Excellent => "excellent",
            LiquidityRating::Good => "good",
            LiquidityRating::Moderate => "moderate",
            LiquidityRating::Low => "low",
            LiquidityRating::VeryLow => "very_low",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeRating {
    High,
    Moderate,
    Low,
}

impl std::fmt::Display for VolumeRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VolumeRating::High => "high",
            VolumeRating::Moderate => "moderate",
            VolumeRating::Low => "low",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityRating {
    Mature,
    Established,
    Young,
    New,
}

impl std::fmt::Display for MaturityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MaturityRating::Mature => "mature",
            MaturityRating::Established => "established",
            MaturityRating::Young => "young",
            MaturityRating::New => "new",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallSentiment {
    Positive,
    SlightlyPositive,
    Neutral,
    SlightlyNegative,
    Negative,
}

impl std::fmt::Display for OverallSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OverallSentiment::Positive => "POSITIVE",
            OverallSentiment::SlightlyPositive => "SLIGHTLY_POSITIVE",
            OverallSentiment::Neutral => "NEUTRAL",
            OverallSentiment::SlightlyNegative => "SLIGHTLY_NEGATIVE",
            OverallSentiment::Negative => "NEGATIVE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityActivity {
    VeryActive,
    Active,
    Moderate,
    Low,
    Inactive,
}

impl std::fmt::Display for CommunityActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommunityActivity::VeryActive => "very_active",
            CommunityActivity::Active => "active",
            CommunityActivity::Moderate => "moderate",
            CommunityActivity::Low => "low",
            CommunityActivity::Inactive => "inactive",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Final directional call. Variants are declared most bearish first so the
/// derived ordering runs bearish < neutral < bullish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    ExtremelyBearish,
    Bearish,
    SlightlyBearish,
    Neutral,
    SlightlyBullish,
    Bullish,
    ExtremelyBullish,
}

impl Verdict {
    pub const ALL: [Verdict; 7] = [
        Verdict::ExtremelyBearish,
        Verdict::Bearish,
        Verdict::SlightlyBearish,
        Verdict::Neutral,
        Verdict::SlightlyBullish,
        Verdict::Bullish,
        Verdict::ExtremelyBullish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::ExtremelyBearish => "EXTREMELY_BEARISH",
            Verdict::Bearish => "BEARISH",
            Verdict::SlightlyBearish => "SLIGHTLY_BEARISH",
            Verdict::Neutral => "NEUTRAL",
            Verdict::SlightlyBullish => "SLIGHTLY_BULLISH",
            Verdict::Bullish => "BULLISH",
            Verdict::ExtremelyBullish => "EXTREMELY_BULLISH",
        }
    }

    pub fn is_bullish(&self) -> bool {
        *self > Verdict::Neutral
    }

    pub fn is_bearish(&self) -> bool {
        *self < Verdict::Neutral
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verdict label {0:?}")]
pub struct UnknownVerdict(pub String);

impl FromStr for Verdict {
    type Err = UnknownVerdict;

    /// Accepts `EXTREMELY_BULLISH`, `extremely-bullish` and `Extremely Bullish`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        Verdict::ALL
            .into_iter()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| UnknownVerdict(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers shared by the scorers
// ---------------------------------------------------------------------------

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
