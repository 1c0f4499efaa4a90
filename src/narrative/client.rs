use serde_json::{json, Value};
use tracing::{debug, info};

use super::{Narrative, NarrativeError, NarrativePrompt, Persona};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::http_client;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// OpenAI-compatible chat-completions client for the narrative step.
#[derive(Clone)]
pub struct NarrativeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl NarrativeClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            http: http_client(cfg)?,
            api_url: cfg.llm_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.llm_api_key.clone(),
            model: cfg.llm_model.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate(
        &self,
        persona: &Persona,
        prompt: &NarrativePrompt,
    ) -> std::result::Result<Narrative, NarrativeError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(NarrativeError::Disabled("LLM_API_KEY is not set".to_string()));
        };

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": persona.text },
                { "role": "user", "content": prompt.render() },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": { "type": "json_object" },
        });

        info!(
            model = %self.model,
            persona = %persona.version,
            address = %prompt.contract_address,
            "requesting narrative"
        );
        let resp: Value = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = completion_content(&resp).ok_or(NarrativeError::EmptyResponse)?;
        debug!(chars = content.len(), "narrative content received");
        parse_narrative(content)
    }
}

/// `choices[0].message.content`, if non-empty.
pub fn completion_content(resp: &Value) -> Option<&str> {
    resp.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|s| !s.trim().is_empty())
}

/// Parse the model's JSON object. Missing text fields become empty; a
/// non-object body is `Unparseable` and carries the raw text.
pub fn parse_narrative(content: &str) -> std::result::Result<Narrative, NarrativeError> {
    let unparseable = || NarrativeError::Unparseable {
        raw: content.to_string(),
    };
    let value: Value = serde_json::from_str(strip_code_fence(content)).map_err(|_| unparseable())?;
    let obj = value.as_object().ok_or_else(unparseable)?;

    let text = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let list = |key: &str| -> Vec<String> {
        obj.get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    Ok(Narrative {
        verdict: obj
            .get("verdict")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        strength: obj.get("strength").and_then(strength_value),
        summary: text("summary"),
        recommendation: text("recommendation"),
        risk_factors: list("risk_factors"),
        opportunities: list("opportunities"),
    })
}

/// Strength arrives as an integer, a float, or occasionally a numeric string.
fn strength_value(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f.round() as i64);
    }
    v.as_str()?.trim().parse::<f64>().ok().map(|f| f.round() as i64)
}

/// Models sometimes wrap JSON in a ```json fence despite being asked not to.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
