//! Human-readable rendering: number formatting and the console report.

use std::fmt::Write as _;

use crate::analyst::AnalysisReport;
use crate::clock::format_unix_secs_iso;

const RULE: &str = "══════════════════════════════════════════════════════════════";
const SUMMARY_PREVIEW_CHARS: usize = 60;

/// `1234.5` -> `1.23K`, `2_500_000` -> `2.50M`. `None` renders as `N/A`.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    let (scaled, suffix) = scale(v, true);
    format!("{scaled:.decimals$}{suffix}")
}

/// Dollar amounts with K/M/B suffixes; sub-dollar prices keep 8 decimals.
pub fn format_usd(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    if v.abs() < 1.0 {
        return format!("${v:.8}");
    }
    let (scaled, suffix) = scale(v, false);
    format!("${scaled:.2}{suffix}")
}

/// Signed percentage: `+5.25%`, `-3.10%`, `0.00%`.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(v) if v > 0.0 => format!("+{v:.2}%"),
        Some(v) => format!("{v:.2}%"),
    }
}

/// Whole number with thousands separators: `1234567.4` -> `1,234,567`.
pub fn format_grouped(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn scale(v: f64, with_trillions: bool) -> (f64, &'static str) {
    let a = v.abs();
    if with_trillions && a >= 1e12 {
        (v / 1e12, "T")
    } else if a >= 1e9 {
        (v / 1e9, "B")
    } else if a >= 1e6 {
        (v / 1e6, "M")
    } else if a >= 1e3 {
        (v / 1e3, "K")
    } else {
        (v, "")
    }
}

/// Boxed console report followed by the narrative sections, if any.
pub fn render_text(report: &AnalysisReport) -> String {
    let token = &report.token;
    let v = &report.verdict;
    let marker = if v.verdict.is_bullish() {
        "▲"
    } else if v.verdict.is_bearish() {
        "▼"
    } else {
        "■"
    };
    let contract: String = token.contract_address.chars().take(20).collect();

    let mut out = String::new();
    let _ = writeln!(out, "╔{RULE}╗");
    let _ = writeln!(
        out,
        "║  ANALYSIS REPORT - {}",
        token.symbol.as_deref().unwrap_or("UNKNOWN")
    );
    let _ = writeln!(out, "╠{RULE}╣");
    let _ = writeln!(out, "║  Contract: {contract}...");
    let _ = writeln!(out, "║  Price: {}", format_usd(Some(token.price_usd)));
    let _ = writeln!(out, "║  24h Change: {}", format_percentage(token.price_change_24h));
    let _ = writeln!(out, "║  Liquidity: {}", format_usd(token.liquidity_usd));
    let _ = writeln!(out, "║  Volume 24h: {}", format_usd(token.volume_24h));
    let _ = writeln!(out, "╠{RULE}╣");
    let _ = writeln!(out, "║  {marker} VERDICT: {}", v.verdict);
    let _ = writeln!(out, "║  Strength: {}/100", v.strength);
    let _ = writeln!(out, "║  Combined Score: {:.1}/100", v.combined_score);
    let _ = writeln!(out, "╠{RULE}╣");
    let _ = writeln!(
        out,
        "║  Technical Score: {:.1}/100 ({})",
        v.technical.score, v.technical.signal
    );
    let _ = writeln!(
        out,
        "║  Fundamental Score: {:.1}/100 ({})",
        v.fundamental.score, v.fundamental.signal
    );
    let _ = writeln!(
        out,
        "║  Sentiment Score: {:.1}/100 ({})",
        v.sentiment.sentiment_score, v.sentiment.signal
    );
    if let Some(followers) = v.sentiment.twitter_followers {
        let _ = writeln!(out, "║  Twitter Followers: {}", format_number(Some(followers as f64), 1));
    }
    if let Some(members) = v.sentiment.telegram_members {
        let _ = writeln!(out, "║  Telegram Members: {}", format_number(Some(members as f64), 1));
    }
    if let Some(summary) = v.narrative_summary.as_deref().filter(|s| !s.is_empty()) {
        let preview: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        let _ = writeln!(out, "╠{RULE}╣");
        let _ = writeln!(out, "║  NARRATIVE SUMMARY:");
        let _ = writeln!(out, "║  {preview}...");
    }
    let _ = writeln!(out, "╚{RULE}╝");
    let _ = writeln!(out, "Analyzed at {}", format_unix_secs_iso(report.analyzed_at));

    if let Some(summary) = v.narrative_summary.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(out, "\n{summary}\n");
    }
    if let Some(rec) = v.narrative_recommendation.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(out, "\nRecommendation: {rec}\n");
    }
    if !v.risk_factors.is_empty() {
        let _ = writeln!(out, "\nRisk Factors:");
        for risk in &v.risk_factors {
            let _ = writeln!(out, "  - {risk}");
        }
    }
    if !v.opportunities.is_empty() {
        let _ = writeln!(out, "\nOpportunities:");
        for opp in &v.opportunities {
            let _ = writeln!(out, "  - {opp}");
        }
    }
    out
}
