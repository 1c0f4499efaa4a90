//! Optional narrative step: a language model reads the numeric analysis and
//! returns prose plus, possibly, its own verdict.

pub mod client;
pub mod prompt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::NarrativeClient;
pub use prompt::{NarrativePrompt, Persona};

/// Parsed narrative response. Only `verdict` + `strength` can affect the
/// numeric result, and only through [`crate::verdict::CombinedVerdict::with_narrative`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub verdict: Option<String>,
    pub strength: Option<i64>,
    pub summary: String,
    pub recommendation: String,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative step disabled: {0}")]
    Disabled(String),

    #[error("narrative request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("narrative model returned no content")]
    EmptyResponse,

    /// The model answered, but not with the JSON object we asked for.
    #[error("narrative response was not valid JSON")]
    Unparseable { raw: String },
}
