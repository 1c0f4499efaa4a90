//! REST clients for the market-data providers. Everything here is I/O plus
//! JSON mapping into the types the scorers consume.

pub mod coingecko;
pub mod dexscreener;

use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;

pub use coingecko::CoinGeckoClient;
pub use dexscreener::DexScreenerClient;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub(crate) fn http_client(cfg: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Shape check only: base58 alphabet, 32-44 characters. Does not decode.
pub fn is_valid_solana_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Numeric field that providers send either as a JSON number or a decimal string.
pub(crate) fn json_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// `v[a][b]...` as a number.
pub(crate) fn json_path_f64(v: &Value, path: &[&str]) -> Option<f64> {
    path.iter().try_fold(v, |acc, key| acc.get(key)).and_then(json_f64)
}

pub(crate) fn json_path_str<'a>(v: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(v, |acc, key| acc.get(key))
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_shape() {
        assert!(is_valid_solana_address("So11111111111111111111111111111111111111112"));
        assert!(is_valid_solana_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        // too short
        assert!(!is_valid_solana_address("So1111"));
        // '0', 'O', 'I' and 'l' are not base58
        assert!(!is_valid_solana_address("0o11111111111111111111111111111111111111112"));
        assert!(!is_valid_solana_address("Il11111111111111111111111111111111111111112"));
        assert!(!is_valid_solana_address(""));
    }

    #[test]
    fn numbers_or_numeric_strings() {
        let v = json!({ "a": { "b": "1.25" }, "n": 3, "bad": "abc", "null": null });
        assert_eq!(json_path_f64(&v, &["a", "b"]), Some(1.25));
        assert_eq!(json_path_f64(&v, &["n"]), Some(3.0));
        assert_eq!(json_path_f64(&v, &["bad"]), None);
        assert_eq!(json_path_f64(&v, &["null"]), None);
        assert_eq!(json_path_f64(&v, &["missing", "deeper"]), None);
    }
}
