use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::report::{format_grouped, format_usd};
use crate::types::MarketSnapshot;
use crate::verdict::CombinedVerdict;

/// System persona handed to the narrative model. Lives outside the binary so it
/// can be revised without touching the scoring code; `version` is the file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub version: String,
    pub text: String,
}

impl Persona {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Config(format!(
                "persona file {} is empty",
                path.display()
            )));
        }
        let version = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unversioned".to_string());
        Ok(Self { version, text })
    }
}

/// One component's headline numbers as the model sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBrief {
    pub score: f64,
    pub signal: String,
    /// Label lines such as `("RSI", "72.4 (overbought)")`.
    pub details: Vec<(String, String)>,
    pub summary: String,
}

/// Structured payload describing one analysis for the narrative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePrompt {
    pub contract_address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price_usd: f64,
    pub price_change_24h: Option<f64>,
    pub technical: ComponentBrief,
    pub fundamental: ComponentBrief,
    pub sentiment: ComponentBrief,
    pub combined_score: f64,
    pub preliminary_verdict: String,
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

impl NarrativePrompt {
    pub fn new(snapshot: &MarketSnapshot, verdict: &CombinedVerdict) -> Self {
        let t = &verdict.technical;
        let f = &verdict.fundamental;
        let s = &verdict.sentiment;

        let rsi = match (t.rsi_14, t.rsi_signal) {
            (Some(v), Some(sig)) => format!("{v:.1} ({sig})"),
            _ => "N/A".to_string(),
        };
        let age = match (f.token_age_days, f.maturity_rating) {
            (Some(days), Some(m)) => format!("{days} days ({m})"),
            _ => "unknown".to_string(),
        };

        Self {
            contract_address: snapshot.contract_address.clone(),
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            price_usd: snapshot.price_usd,
            price_change_24h: snapshot.price_changes.h24,
            technical: ComponentBrief {
                score: t.score,
                signal: t.signal.to_string(),
                details: vec![
                    ("RSI".to_string(), rsi),
                    ("MACD".to_string(), or_na(t.macd_trend)),
                    ("Trend".to_string(), or_na(t.trend_direction)),
                ],
                summary: t.summary.clone(),
            },
            fundamental: ComponentBrief {
                score: f.score,
                signal: f.signal.to_string(),
                details: vec![
                    (
                        "Liquidity".to_string(),
                        format!("${} ({})", format_grouped(f.liquidity_usd), f.liquidity_rating),
                    ),
                    (
                        "Volume 24h".to_string(),
                        format!("${} ({})", format_grouped(f.volume_24h), f.volume_rating),
                    ),
                    ("Token Age".to_string(), age),
                ],
                summary: f.summary.clone(),
            },
            sentiment: ComponentBrief {
                score: s.sentiment_score,
                signal: s.signal.to_string(),
                details: vec![
                    ("Overall".to_string(), s.overall_sentiment.to_string()),
                    ("Community".to_string(), s.community_activity.to_string()),
                ],
                summary: s.summary.clone(),
            },
            combined_score: verdict.combined_score,
            preliminary_verdict: verdict.verdict.to_string(),
        }
    }

    /// User-message text for the chat request.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Analyze this token:");
        let _ = writeln!(
            out,
            "TOKEN: {} ({})",
            self.symbol.as_deref().unwrap_or("?"),
            self.name.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(out, "Contract: {}", self.contract_address);
        let _ = writeln!(out, "Price: {}", format_usd(Some(self.price_usd)));
        let _ = writeln!(
            out,
            "24h Change: {}",
            self.price_change_24h
                .map_or_else(|| "N/A".to_string(), |c| format!("{c:.2}%"))
        );

        for (title, brief) in [
            ("TECHNICAL", &self.technical),
            ("FUNDAMENTAL", &self.fundamental),
            ("SENTIMENT", &self.sentiment),
        ] {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{title} ANALYSIS (Score: {:.1}/100, {}):",
                brief.score, brief.signal
            );
            for (label, value) in &brief.details {
                let _ = writeln!(out, "- {label}: {value}");
            }
            let _ = writeln!(out, "- {}", brief.summary);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "COMBINED SCORE: {:.1}/100", self.combined_score);
        let _ = writeln!(out, "PRELIMINARY VERDICT: {}", self.preliminary_verdict);
        let _ = write!(out, "Respond with the JSON object described in your instructions.");
        out
    }
}
