use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BASE_SCORE;
use crate::report::format_grouped;
use crate::types::{
    clamp_score, CommunityActivity, MarketSnapshot, OverallSentiment, PriceChanges,
    SecondaryMetrics, Signal, SocialLinks, TxnCounts,
};

pub const SIGNIFICANT_FOLLOWERS: u64 = 1_000;
pub const SIGNIFICANT_CHANNEL_MEMBERS: u64 = 500;

/// Share of the running score kept when price momentum is blended in.
const PRICE_BLEND_PRIOR: f64 = 0.6;
/// Share of the running score kept when buy/sell skew is blended in.
const TXN_BLEND_PRIOR: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment_score: f64,
    pub overall_sentiment: OverallSentiment,
    pub community_activity: CommunityActivity,
    pub twitter_followers: Option<u64>,
    pub telegram_members: Option<u64>,
    pub signal: Signal,
    pub summary: String,
}

/// Score community mood from secondary votes and scores, then fold in price
/// momentum and the 24h buy/sell skew as running blends.
pub fn analyze(
    snapshot: &MarketSnapshot,
    secondary: Option<&SecondaryMetrics>,
    price_changes: Option<&PriceChanges>,
) -> SentimentResult {
    let mut score = secondary.map_or(BASE_SCORE, secondary_sentiment);

    if let Some(changes) = price_changes {
        score = score * PRICE_BLEND_PRIOR + price_sentiment(changes) * (1.0 - PRICE_BLEND_PRIOR);
    }
    if let Some(txns) = snapshot.txns_24h {
        score = score * TXN_BLEND_PRIOR + transaction_sentiment(&txns) * (1.0 - TXN_BLEND_PRIOR);
    }
    let score = clamp_score(score);

    let twitter_followers = secondary.and_then(|s| s.twitter_followers);
    let telegram_members = secondary.and_then(|s| s.telegram_members);

    let mut result = SentimentResult {
        sentiment_score: score,
        overall_sentiment: overall_sentiment(score),
        community_activity: rate_community(&snapshot.socials, twitter_followers, telegram_members),
        twitter_followers,
        telegram_members,
        signal: Signal::from_score(score),
        summary: String::new(),
    };
    result.summary = summarize(&result);

    debug!(
        score = result.sentiment_score,
        signal = %result.signal,
        community = %result.community_activity,
        "sentiment score"
    );
    result
}

/// Up-vote percentage (when both vote shares are reported), then a running
/// average with community score x10, then with public interest x10.
pub fn secondary_sentiment(metrics: &SecondaryMetrics) -> f64 {
    let mut score = match (metrics.sentiment_votes_up_pct, metrics.sentiment_votes_down_pct) {
        (Some(up), Some(_)) => up,
        _ => BASE_SCORE,
    };
    if let Some(community) = metrics.community_score {
        score = (score + community * 10.0) / 2.0;
    }
    if let Some(interest) = metrics.public_interest_score {
        score = (score + interest * 10.0) / 2.0;
    }
    score
}

/// +20% weighted change maps to 100, -20% to 0.
pub fn price_sentiment(changes: &PriceChanges) -> f64 {
    let weighted = changes.blend(0.5, 0.3, 0.2);
    clamp_score(BASE_SCORE + weighted * 2.5)
}

/// Buy share of 24h transactions on a 0-100 scale; 50 with no trades.
pub fn transaction_sentiment(txns: &TxnCounts) -> f64 {
    let total = txns.buys + txns.sells;
    if total == 0 {
        return BASE_SCORE;
    }
    txns.buys as f64 / total as f64 * 100.0
}

pub fn rate_community(
    socials: &SocialLinks,
    twitter_followers: Option<u64>,
    telegram_members: Option<u64>,
) -> CommunityActivity {
    let channels = socials.channel_count();
    let significant = twitter_followers.is_some_and(|n| n >= SIGNIFICANT_FOLLOWERS)
        || telegram_members.is_some_and(|n| n >= SIGNIFICANT_CHANNEL_MEMBERS);

    if channels >= 3 && significant {
        CommunityActivity::VeryActive
    } else if channels >= 2 && significant {
        CommunityActivity::Active
    } else if channels >= 2 || significant {
        CommunityActivity::Moderate
    } else if channels >= 1 {
        CommunityActivity::Low
    } else {
        CommunityActivity::Inactive
    }
}

pub fn overall_sentiment(score: f64) -> OverallSentiment {
    if score >= 70.0 {
        OverallSentiment::Positive
    } else if score >= 55.0 {
        OverallSentiment::SlightlyPositive
    } else if score <= 30.0 {
        OverallSentiment::Negative
    } else if score <= 45.0 {
        OverallSentiment::SlightlyNegative
    } else {
        OverallSentiment::Neutral
    }
}

fn summarize(result: &SentimentResult) -> String {
    let mut points = vec![
        format!("Overall sentiment: {}", result.overall_sentiment),
        format!("Community activity: {}", result.community_activity),
    ];
    if let Some(followers) = result.twitter_followers.filter(|n| *n > 0) {
        points.push(format!("Twitter followers: {}", format_grouped(followers as f64)));
    }
    if let Some(members) = result.telegram_members.filter(|n| *n > 0) {
        points.push(format!("Telegram members: {}", format_grouped(members as f64)));
    }
    points.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(twitter: bool, telegram: bool, discord: bool) -> SocialLinks {
        let link = |on: bool, url: &str| on.then(|| url.to_string());
        SocialLinks {
            website: Some("https://example.org".to_string()),
            twitter: link(twitter, "https://x.com/example"),
            telegram: link(telegram, "https://t.me/example"),
            discord: link(discord, "https://discord.gg/example"),
        }
    }

    #[test]
    fn no_inputs_stay_neutral() {
        let result = analyze(&MarketSnapshot::default(), None, None);
        assert_eq!(result.sentiment_score, 50.0);
        assert_eq!(result.overall_sentiment, OverallSentiment::Neutral);
        assert_eq!(result.community_activity, CommunityActivity::Inactive);
        assert_eq!(result.signal, Signal::Neutral);
    }

    #[test]
    fn blends_votes_momentum_and_flow() {
        let secondary = SecondaryMetrics {
            sentiment_votes_up_pct: Some(80.0),
            sentiment_votes_down_pct: Some(20.0),
            community_score: Some(7.0),
            twitter_followers: Some(12_000),
            ..SecondaryMetrics::default()
        };
        let snapshot = MarketSnapshot {
            txns_24h: Some(TxnCounts { buys: 600, sells: 400 }),
            socials: links(true, true, false),
            ..MarketSnapshot::default()
        };
        let changes = PriceChanges { h1: Some(5.0), h6: Some(10.0), h24: Some(20.0) };

        let result = analyze(&snapshot, Some(&secondary), Some(&changes));
        // votes 80 -> (80 + 70) / 2 = 75; momentum 73.75 -> 74.5; flow 60 -> 70.15
        assert!((result.sentiment_score - 70.15).abs() < 1e-9);
        assert_eq!(result.overall_sentiment, OverallSentiment::Positive);
        assert_eq!(result.signal, Signal::Bullish);
        assert_eq!(result.community_activity, CommunityActivity::Active);
        assert_eq!(result.twitter_followers, Some(12_000));
    }

    #[test]
    fn heavy_selling_turns_bearish() {
        let snapshot = MarketSnapshot {
            txns_24h: Some(TxnCounts { buys: 0, sells: 10 }),
            ..MarketSnapshot::default()
        };
        let crash = PriceChanges { h1: Some(-20.0), h6: Some(-20.0), h24: Some(-20.0) };
        let result = analyze(&snapshot, None, Some(&crash));
        // 0.6 * 50 + 0.4 * 0 = 30; 0.7 * 30 + 0.3 * 0 = 21
        assert!((result.sentiment_score - 21.0).abs() < 1e-9);
        assert_eq!(result.overall_sentiment, OverallSentiment::Negative);
        assert_eq!(result.signal, Signal::Bearish);
    }

    #[test]
    fn secondary_running_average_is_ordered() {
        let metrics = SecondaryMetrics {
            sentiment_votes_up_pct: Some(100.0),
            sentiment_votes_down_pct: Some(0.0),
            community_score: Some(0.0),
            public_interest_score: Some(10.0),
            ..SecondaryMetrics::default()
        };
        // (100 + 0) / 2 = 50, then (50 + 100) / 2 = 75
        assert_eq!(secondary_sentiment(&metrics), 75.0);

        let up_only = SecondaryMetrics {
            sentiment_votes_up_pct: Some(90.0),
            ..SecondaryMetrics::default()
        };
        assert_eq!(secondary_sentiment(&up_only), 50.0);
    }

    #[test]
    fn price_sentiment_is_clamped() {
        let moon = PriceChanges { h1: Some(100.0), h6: None, h24: None };
        assert_eq!(price_sentiment(&moon), 100.0);
        let flat = PriceChanges::default();
        assert_eq!(price_sentiment(&flat), 50.0);
    }

    #[test]
    fn no_trades_is_neutral_flow() {
        assert_eq!(transaction_sentiment(&TxnCounts { buys: 0, sells: 0 }), 50.0);
        assert_eq!(transaction_sentiment(&TxnCounts { buys: 3, sells: 1 }), 75.0);
    }

    #[test]
    fn community_ladder() {
        assert_eq!(
            rate_community(&links(true, true, true), Some(1_000), None),
            CommunityActivity::VeryActive
        );
        assert_eq!(
            rate_community(&links(true, true, true), None, None),
            CommunityActivity::Moderate
        );
        assert_eq!(
            rate_community(&links(true, false, true), None, Some(500)),
            CommunityActivity::Active
        );
        assert_eq!(
            rate_community(&links(false, false, false), Some(5_000), None),
            CommunityActivity::Moderate
        );
        assert_eq!(
            rate_community(&links(false, true, false), Some(999), Some(499)),
            CommunityActivity::Low
        );
        // A website alone is not a channel.
        assert_eq!(
            rate_community(&links(false, false, false), None, None),
            CommunityActivity::Inactive
        );
    }

    #[test]
    fn overall_label_buckets() {
        assert_eq!(overall_sentiment(70.0), OverallSentiment::Positive);
        assert_eq!(overall_sentiment(55.0), OverallSentiment::SlightlyPositive);
        assert_eq!(overall_sentiment(50.0), OverallSentiment::Neutral);
        assert_eq!(overall_sentiment(45.0), OverallSentiment::SlightlyNegative);
        assert_eq!(overall_sentiment(30.0), OverallSentiment::Negative);
    }

    #[test]
    fn summary_includes_follower_counts() {
        let secondary = SecondaryMetrics {
            twitter_followers: Some(12_345),
            telegram_members: Some(0),
            ..SecondaryMetrics::default()
        };
        let result = analyze(&MarketSnapshot::default(), Some(&secondary), None);
        assert_eq!(
            result.summary,
            "Overall sentiment: NEUTRAL. Community activity: moderate. Twitter followers: 12,345"
        );
    }
}
