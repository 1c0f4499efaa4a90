use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyst::{AnalysisReport, TokenSummary};
use crate::clock::format_unix_secs_iso;
use crate::error::Result;
use crate::types::{
    LiquidityRating, MacdTrend, OverallSentiment, Signal, TrendDirection, Verdict, VolumeRating,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRecord {
    pub score: f64,
    pub signal: Signal,
    pub rsi_14: Option<f64>,
    pub macd_trend: Option<MacdTrend>,
    pub trend_direction: Option<TrendDirection>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    pub score: f64,
    pub signal: Signal,
    pub liquidity_rating: LiquidityRating,
    pub volume_rating: VolumeRating,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub score: f64,
    pub signal: Signal,
    pub overall_sentiment: OverallSentiment,
    pub summary: String,
}

/// Flat export shape for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub token: TokenSummary,
    pub verdict: Verdict,
    pub strength: u8,
    pub combined_score: f64,
    pub narrative_override: bool,
    pub technical: TechnicalRecord,
    pub fundamental: FundamentalRecord,
    pub sentiment: SentimentRecord,
    pub narrative_summary: Option<String>,
    pub narrative_recommendation: Option<String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
    /// ISO-8601, UTC.
    pub analyzed_at: String,
}

impl ExportRecord {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let v = &report.verdict;
        Self {
            token: report.token.clone(),
            verdict: v.verdict,
            strength: v.strength,
            combined_score: v.combined_score,
            narrative_override: v.narrative_override,
            technical: TechnicalRecord {
                score: v.technical.score,
                signal: v.technical.signal,
                rsi_14: v.technical.rsi_14,
                macd_trend: v.technical.macd_trend,
                trend_direction: v.technical.trend_direction,
                summary: v.technical.summary.clone(),
            },
            fundamental: FundamentalRecord {
                score: v.fundamental.score,
                signal: v.fundamental.signal,
                liquidity_rating: v.fundamental.liquidity_rating,
                volume_rating: v.fundamental.volume_rating,
                summary: v.fundamental.summary.clone(),
            },
            sentiment: SentimentRecord {
                score: v.sentiment.sentiment_score,
                signal: v.sentiment.signal,
                overall_sentiment: v.sentiment.overall_sentiment,
                summary: v.sentiment.summary.clone(),
            },
            narrative_summary: v.narrative_summary.clone(),
            narrative_recommendation: v.narrative_recommendation.clone(),
            risk_factors: v.risk_factors.clone(),
            opportunities: v.opportunities.clone(),
            analyzed_at: format_unix_secs_iso(report.analyzed_at),
        }
    }
}

/// Write records as a pretty-printed JSON array.
pub fn write_json(path: &Path, records: &[ExportRecord]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, records)?;
    out.write_all(b"\n")?;
    out.flush()?;
    info!(path = %path.display(), records = records.len(), "exported analysis");
    Ok(())
}
