use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com";
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const LLM_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";
pub const DEFAULT_PERSONA_PATH: &str = "prompts/analyst-v1.txt";
pub const DEFAULT_CHAIN_ID: &str = "solana";

/// Request timeout for every provider call (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Max tokens analysed in flight by `batch`.
pub const ANALYZE_CONCURRENCY: usize = 4;

/// Component weights for the combined score. Must sum to 1.0.
pub mod weights {
    pub const TECHNICAL: f64 = 0.40;
    pub const FUNDAMENTAL: f64 = 0.35;
    pub const SENTIMENT: f64 = 0.25;
}

/// Sub-score cut-offs shared by every scorer's BULLISH/BEARISH/NEUTRAL label.
pub mod signal_thresholds {
    pub const BULLISH_MIN: f64 = 65.0;
    pub const BEARISH_MAX: f64 = 35.0;
}

/// Seven-level verdict ladder, checked top to bottom.
pub mod verdict_thresholds {
    pub const EXTREMELY_BULLISH_MIN: f64 = 80.0;
    pub const BULLISH_MIN: f64 = 65.0;
    pub const SLIGHTLY_BULLISH_MIN: f64 = 55.0;
    pub const EXTREMELY_BEARISH_MAX: f64 = 20.0;
    pub const BEARISH_MAX: f64 = 35.0;
    pub const SLIGHTLY_BEARISH_MAX: f64 = 45.0;
}

/// A narrative verdict replaces the numeric one only above this strength.
pub const NARRATIVE_OVERRIDE_MIN_STRENGTH: i64 = 70;

/// Synthetic history is padded until it has at least this many points...
pub const HISTORY_MIN_POINTS: usize = 20;
/// ...and never grows past this.
pub const HISTORY_MAX_POINTS: usize = 50;

/// USD floors, highest first.
pub mod liquidity_thresholds {
    pub const EXCELLENT: f64 = 1_000_000.0;
    pub const GOOD: f64 = 100_000.0;
    pub const MODERATE: f64 = 10_000.0;
    pub const LOW: f64 = 1_000.0;
}

pub mod volume_thresholds {
    pub const HIGH: f64 = 100_000.0;
    pub const MODERATE: f64 = 10_000.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub dexscreener_api_url: String,
    pub coingecko_api_url: String,
    /// Pro key, sent as `x-cg-pro-api-key` (COINGECKO_API_KEY)
    pub coingecko_api_key: Option<String>,
    /// Chain slug used in provider paths and search filtering (CHAIN_ID)
    pub chain_id: String,
    pub http_timeout_secs: u64,
    pub llm_api_url: String,
    /// Narrative step is disabled when unset (LLM_API_KEY)
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Versioned persona text handed to the narrative model (NARRATIVE_PERSONA_PATH)
    pub persona_path: PathBuf,
    /// Tokens analysed in parallel by batch runs (ANALYZE_CONCURRENCY)
    pub analyze_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dexscreener_api_url: std::env::var("DEXSCREENER_API_URL")
                .unwrap_or_else(|_| DEXSCREENER_API_URL.to_string()),
            coingecko_api_url: std::env::var("COINGECKO_API_URL")
                .unwrap_or_else(|_| COINGECKO_API_URL.to_string()),
            coingecko_api_key: non_empty_var("COINGECKO_API_KEY"),
            chain_id: std::env::var("CHAIN_ID").unwrap_or_else(|_| DEFAULT_CHAIN_ID.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("HTTP_TIMEOUT_SECS must be a whole number of seconds".to_string())
                })?,
            llm_api_url: std::env::var("LLM_API_URL").unwrap_or_else(|_| LLM_API_URL.to_string()),
            llm_api_key: non_empty_var("LLM_API_KEY"),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            persona_path: std::env::var("NARRATIVE_PERSONA_PATH")
                .unwrap_or_else(|_| DEFAULT_PERSONA_PATH.to_string())
                .into(),
            analyze_concurrency: std::env::var("ANALYZE_CONCURRENCY")
                .unwrap_or_else(|_| ANALYZE_CONCURRENCY.to_string())
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config("ANALYZE_CONCURRENCY must be a positive integer".to_string())
                })?,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub(crate) fn sample() -> Self {
        Self {
            log_level: "debug".to_string(),
            dexscreener_api_url: DEXSCREENER_API_URL.to_string(),
            coingecko_api_url: COINGECKO_API_URL.to_string(),
            coingecko_api_key: None,
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            llm_api_url: LLM_API_URL.to_string(),
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            persona_path: DEFAULT_PERSONA_PATH.into(),
            analyze_concurrency: ANALYZE_CONCURRENCY,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
