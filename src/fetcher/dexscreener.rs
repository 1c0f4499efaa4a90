use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{http_client, json_f64, json_path_f64, json_path_str};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{
    CreationStamp, MarketSnapshot, PoolListing, PriceChanges, SocialLinks, TxnCounts,
    VolumeWindows,
};

/// Primary market-data provider: pairs, prices, volumes, liquidity, socials.
#[derive(Clone)]
pub struct DexScreenerClient {
    http: reqwest::Client,
    base_url: String,
    chain_id: String,
}

/// One pair from a free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price_usd: Option<f64>,
    pub dex_id: Option<String>,
    pub liquidity_usd: Option<f64>,
}

/// A boosted ("trending") token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingToken {
    pub token_address: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub total_amount: Option<f64>,
}

impl DexScreenerClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            http: http_client(cfg)?,
            base_url: cfg.dexscreener_api_url.trim_end_matches('/').to_string(),
            chain_id: cfg.chain_id.clone(),
        })
    }

    /// GET a JSON document; non-success statuses are logged and read as "no data".
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%status, url, "DexScreener request failed");
            return Ok(None);
        }
        Ok(Some(resp.json().await?))
    }

    /// Every pair for `address` on the configured chain, falling back to the
    /// cross-chain token endpoint when the pair listing is empty.
    pub async fn token_pairs(&self, address: &str) -> Result<Vec<Value>> {
        let url = format!("{}/token-pairs/v1/{}/{}", self.base_url, self.chain_id, address);
        if let Some(Value::Array(pairs)) = self.get_json(&url, &[]).await? {
            if !pairs.is_empty() {
                return Ok(pairs);
            }
        }

        debug!(address, "no pairs from token-pairs endpoint, trying tokens endpoint");
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, address);
        let pairs = self
            .get_json(&url, &[])
            .await?
            .and_then(|body| match body.get("pairs") {
                Some(Value::Array(pairs)) => Some(pairs.clone()),
                _ => None,
            })
            .unwrap_or_default();
        Ok(pairs)
    }

    pub async fn fetch_snapshot(&self, address: &str) -> Result<MarketSnapshot> {
        let pairs = self.token_pairs(address).await?;
        let snapshot = parse_snapshot(address, &pairs)?;
        info!(
            address,
            symbol = snapshot.symbol.as_deref().unwrap_or("?"),
            price = snapshot.price_usd,
            pools = snapshot.pools.len(),
            "fetched market snapshot"
        );
        Ok(snapshot)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = format!("{}/latest/dex/search", self.base_url);
        let Some(body) = self.get_json(&url, &[("q", query)]).await? else {
            return Ok(Vec::new());
        };
        Ok(parse_search(&body, &self.chain_id))
    }

    pub async fn trending(&self) -> Result<Vec<TrendingToken>> {
        let url = format!("{}/token-boosts/top/v1", self.base_url);
        let Some(body) = self.get_json(&url, &[]).await? else {
            return Ok(Vec::new());
        };
        Ok(parse_trending(&body, &self.chain_id))
    }
}

// ---------------------------------------------------------------------------
// JSON mapping
// ---------------------------------------------------------------------------

/// The pair with the deepest USD liquidity; the first pair when none report any.
pub fn best_pair(pairs: &[Value]) -> Option<&Value> {
    pairs
        .iter()
        .filter_map(|p| json_path_f64(p, &["liquidity", "usd"]).map(|liq| (liq, p)))
        .filter(|(liq, _)| *liq > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, p)| p)
        .or_else(|| pairs.first())
}

/// Build a snapshot from the provider's pair list.
pub fn parse_snapshot(address: &str, pairs: &[Value]) -> Result<MarketSnapshot> {
    let pair = best_pair(pairs).ok_or_else(|| AppError::TokenNotFound(address.to_string()))?;

    let price_usd = pair
        .get("priceUsd")
        .and_then(json_f64)
        .filter(|p| *p > 0.0)
        .ok_or_else(|| AppError::MissingPrice(address.to_string()))?;

    let pair_created_at = match pair.get("pairCreatedAt") {
        Some(Value::Number(n)) => n.as_f64().map(CreationStamp::EpochMillis),
        Some(Value::String(s)) => Some(CreationStamp::Text(s.clone())),
        _ => None,
    };

    let pools = pairs
        .iter()
        .map(|p| PoolListing {
            dex_id: json_path_str(p, &["dexId"]).unwrap_or("unknown").to_string(),
            pair_address: json_path_str(p, &["pairAddress"]).map(str::to_string),
        })
        .collect();

    // Only a non-empty txns object counts as "reported".
    let txns_24h = pair
        .get("txns")
        .and_then(|t| t.as_object())
        .filter(|t| !t.is_empty())
        .map(|t| {
            let h24 = t.get("h24");
            let count = |key: &str| h24.and_then(|h| h.get(key)).and_then(|v| v.as_u64()).unwrap_or(0);
            TxnCounts {
                buys: count("buys"),
                sells: count("sells"),
            }
        });

    Ok(MarketSnapshot {
        contract_address: address.to_string(),
        name: json_path_str(pair, &["baseToken", "name"]).map(str::to_string),
        symbol: json_path_str(pair, &["baseToken", "symbol"]).map(str::to_string),
        price_usd,
        price_changes: PriceChanges {
            h1: json_path_f64(pair, &["priceChange", "h1"]),
            h6: json_path_f64(pair, &["priceChange", "h6"]),
            h24: json_path_f64(pair, &["priceChange", "h24"]),
        },
        volumes: VolumeWindows {
            h1: json_path_f64(pair, &["volume", "h1"]),
            h6: json_path_f64(pair, &["volume", "h6"]),
            h24: json_path_f64(pair, &["volume", "h24"]),
        },
        liquidity_usd: json_path_f64(pair, &["liquidity", "usd"]),
        fdv: pair.get("fdv").and_then(json_f64),
        market_cap: pair.get("marketCap").and_then(json_f64),
        pair_created_at,
        dex_name: json_path_str(pair, &["dexId"]).map(str::to_string),
        pair_address: json_path_str(pair, &["pairAddress"]).map(str::to_string),
        pools,
        txns_24h,
        socials: parse_socials(pair.get("info")),
    })
}

fn parse_socials(info: Option<&Value>) -> SocialLinks {
    let Some(info) = info else {
        return SocialLinks::default();
    };
    let mut links = SocialLinks {
        website: info
            .get("websites")
            .and_then(|w| w.get(0))
            .and_then(|w| json_path_str(w, &["url"]))
            .map(str::to_string),
        ..SocialLinks::default()
    };

    for social in info.get("socials").and_then(|s| s.as_array()).into_iter().flatten() {
        let url = json_path_str(social, &["url"]).map(str::to_string);
        match social.get("type").and_then(|t| t.as_str()) {
            Some("twitter") => links.twitter = url,
            Some("telegram") => links.telegram = url,
            Some("discord") => links.discord = url,
            _ => {}
        }
    }
    links
}

pub fn parse_search(body: &Value, chain_id: &str) -> Vec<SearchHit> {
    body.get("pairs")
        .and_then(|p| p.as_array())
        .into_iter()
        .flatten()
        .filter(|pair| pair.get("chainId").and_then(|c| c.as_str()) == Some(chain_id))
        .filter_map(|pair| {
            Some(SearchHit {
                address: json_path_str(pair, &["baseToken", "address"])?.to_string(),
                symbol: json_path_str(pair, &["baseToken", "symbol"]).map(str::to_string),
                name: json_path_str(pair, &["baseToken", "name"]).map(str::to_string),
                price_usd: pair.get("priceUsd").and_then(json_f64),
                dex_id: json_path_str(pair, &["dexId"]).map(str::to_string),
                liquidity_usd: json_path_f64(pair, &["liquidity", "usd"]),
            })
        })
        .collect()
}

pub fn parse_trending(body: &Value, chain_id: &str) -> Vec<TrendingToken> {
    body.as_array()
        .into_iter()
        .flatten()
        .filter(|t| t.get("chainId").and_then(|c| c.as_str()) == Some(chain_id))
        .filter_map(|t| {
            Some(TrendingToken {
                token_address: json_path_str(t, &["tokenAddress"])?.to_string(),
                url: json_path_str(t, &["url"]).map(str::to_string),
                description: json_path_str(t, &["description"]).map(str::to_string),
                total_amount: t.get("totalAmount").and_then(json_f64),
            })
        })
        .collect()
}
