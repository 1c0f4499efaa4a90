use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::{http_client, json_f64, json_path_f64};
use crate::config::Config;
use crate::error::Result;
use crate::types::SecondaryMetrics;

const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Secondary metadata provider: community votes, scores, follower counts.
/// Coverage is patchy, so "not listed" and "rate limited" are both `Ok(None)`.
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    platform: String,
}

impl CoinGeckoClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            http: http_client(cfg)?,
            base_url: cfg.coingecko_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.coingecko_api_key.clone(),
            platform: cfg.chain_id.clone(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        let mut req = self.http.get(format!("{}{}", self.base_url, path)).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let resp = req.send().await?;
        match resp.status() {
            s if s.is_success() => Ok(Some(resp.json().await?)),
            StatusCode::NOT_FOUND => {
                debug!(path, "CoinGecko has no listing");
                Ok(None)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(path, "CoinGecko rate limit reached");
                Ok(None)
            }
            status => {
                warn!(%status, path, "CoinGecko request failed");
                Ok(None)
            }
        }
    }

    pub async fn secondary_metrics(&self, address: &str) -> Result<Option<SecondaryMetrics>> {
        let path = format!("/coins/{}/contract/{}", self.platform, address);
        Ok(self.get_json(&path, &[]).await?.map(|body| parse_metrics(&body)))
    }

    /// Spot SOL/USD.
    pub async fn sol_price(&self) -> Result<Option<f64>> {
        let body = self
            .get_json("/simple/price", &[("ids", "solana"), ("vs_currencies", "usd")])
            .await?;
        Ok(body.and_then(|b| json_path_f64(&b, &["solana", "usd"])))
    }
}

pub fn parse_metrics(body: &Value) -> SecondaryMetrics {
    let count = |path: &[&str]| json_path_f64(body, path).filter(|n| *n >= 0.0).map(|n| n as u64);

    SecondaryMetrics {
        sentiment_votes_up_pct: body.get("sentiment_votes_up_percentage").and_then(json_f64),
        sentiment_votes_down_pct: body.get("sentiment_votes_down_percentage").and_then(json_f64),
        community_score: body.get("community_score").and_then(json_f64),
        public_interest_score: body.get("public_interest_score").and_then(json_f64),
        twitter_followers: count(&["community_data", "twitter_followers"]),
        telegram_members: count(&["community_data", "telegram_channel_user_count"]),
        total_supply: json_path_f64(body, &["market_data", "total_supply"]),
        market_cap_rank: body
            .get("market_cap_rank")
            .and_then(|r| r.as_u64())
            .and_then(|r| u32::try_from(r).ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_community_and_market_data() {
        let body = json!({
            "id": "example",
            "sentiment_votes_up_percentage": 72.5,
            "sentiment_votes_down_percentage": 27.5,
            "community_score": 41.2,
            "public_interest_score": 0.0,
            "market_cap_rank": 312,
            "community_data": {
                "twitter_followers": 15400,
                "telegram_channel_user_count": null
            },
            "market_data": { "total_supply": 1000000000.0 }
        });
        let m = parse_metrics(&body);
        assert_eq!(m.sentiment_votes_up_pct, Some(72.5));
        assert_eq!(m.sentiment_votes_down_pct, Some(27.5));
        assert_eq!(m.community_score, Some(41.2));
        assert_eq!(m.public_interest_score, Some(0.0));
        assert_eq!(m.twitter_followers, Some(15_400));
        assert_eq!(m.telegram_members, None);
        assert_eq!(m.total_supply, Some(1e9));
        assert_eq!(m.market_cap_rank, Some(312));
    }

    #[test]
    fn sparse_body_maps_to_empty_metrics() {
        assert_eq!(parse_metrics(&json!({})), SecondaryMetrics::default());
    }
}
