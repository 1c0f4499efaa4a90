use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::classifier::{classify, strength};
use crate::config::{weights, NARRATIVE_OVERRIDE_MIN_STRENGTH};
use crate::narrative::{Narrative, NarrativeError};
use crate::scorer::{FundamentalResult, SentimentResult, TechnicalResult};
use crate::types::{round_to, Verdict};

const UNPARSEABLE_SUMMARY_CHARS: usize = 500;
const UNPARSEABLE_RECOMMENDATION: &str = "Review the technical and fundamental data";
const UNAVAILABLE_RECOMMENDATION: &str = "Review numerical analysis data";

/// Final result of one analysis. Numeric fields are fixed by [`fuse`]; the
/// narrative fields start empty and are filled once by [`CombinedVerdict::with_narrative`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedVerdict {
    pub technical: TechnicalResult,
    pub fundamental: FundamentalResult,
    pub sentiment: SentimentResult,
    pub combined_score: f64,
    pub verdict: Verdict,
    pub strength: u8,
    pub narrative_summary: Option<String>,
    pub narrative_recommendation: Option<String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
    /// True when the narrative step replaced the numeric verdict and strength.
    #[serde(default)]
    pub narrative_override: bool,
}

/// Weighted sum of the three component scores, rounded to one decimal.
pub fn combined_score(technical: f64, fundamental: f64, sentiment: f64) -> f64 {
    round_to(
        technical * weights::TECHNICAL
            + fundamental * weights::FUNDAMENTAL
            + sentiment * weights::SENTIMENT,
        1,
    )
}

/// Fuse the component results. Verdict and strength derive from the rounded
/// combined score, so the stored score always reproduces the stored label.
pub fn fuse(
    technical: TechnicalResult,
    fundamental: FundamentalResult,
    sentiment: SentimentResult,
) -> CombinedVerdict {
    let combined_score = combined_score(
        technical.score,
        fundamental.score,
        sentiment.sentiment_score,
    );

    CombinedVerdict {
        verdict: classify(combined_score),
        strength: strength(combined_score),
        combined_score,
        technical,
        fundamental,
        sentiment,
        narrative_summary: None,
        narrative_recommendation: None,
        risk_factors: Vec::new(),
        opportunities: Vec::new(),
        narrative_override: false,
    }
}

impl CombinedVerdict {
    /// Attach the narrative outcome.
    ///
    /// A successful narrative with a recognised verdict label and a strength
    /// above the override threshold replaces verdict and strength together.
    /// Any failure keeps the numeric verdict and records a fallback message.
    pub fn with_narrative(mut self, outcome: Result<Narrative, NarrativeError>) -> Self {
        match outcome {
            Ok(narrative) => {
                self.apply_override(narrative.verdict.as_deref(), narrative.strength);
                self.narrative_summary = Some(narrative.summary);
                self.narrative_recommendation = Some(narrative.recommendation);
                self.risk_factors = narrative.risk_factors;
                self.opportunities = narrative.opportunities;
            }
            Err(NarrativeError::Unparseable { raw }) => {
                warn!("narrative response was not JSON, keeping numeric verdict");
                let summary = if raw.trim().is_empty() {
                    "Analysis complete".to_string()
                } else {
                    raw.chars().take(UNPARSEABLE_SUMMARY_CHARS).collect()
                };
                self.narrative_summary = Some(summary);
                self.narrative_recommendation = Some(UNPARSEABLE_RECOMMENDATION.to_string());
            }
            Err(e) => {
                warn!(error = %e, "narrative unavailable, keeping numeric verdict");
                self.narrative_summary = Some(format!("Narrative analysis unavailable: {e}"));
                self.narrative_recommendation = Some(UNAVAILABLE_RECOMMENDATION.to_string());
            }
        }
        self
    }

    fn apply_override(&mut self, label: Option<&str>, narrative_strength: Option<i64>) {
        let (Some(label), Some(narrative_strength)) = (label, narrative_strength) else {
            return;
        };
        if narrative_strength <= NARRATIVE_OVERRIDE_MIN_STRENGTH {
            return;
        }
        match label.parse::<Verdict>() {
            Ok(verdict) => {
                let clamped = narrative_strength.clamp(1, 100) as u8;
                info!(
                    numeric = %self.verdict,
                    narrative = %verdict,
                    strength = clamped,
                    "narrative verdict overrides numeric verdict"
                );
                self.verdict = verdict;
                self.strength = clamped;
                self.narrative_override = true;
            }
            Err(e) => warn!(error = %e, "ignoring narrative verdict"),
        }
    }
}
