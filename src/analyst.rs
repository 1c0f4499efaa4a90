use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::dexscreener::{SearchHit, TrendingToken};
use crate::fetcher::{is_valid_solana_address, CoinGeckoClient, DexScreenerClient};
use crate::history;
use crate::narrative::{NarrativeClient, NarrativeError, NarrativePrompt, Persona};
use crate::scorer::{fundamental, sentiment, technical};
use crate::types::{MarketSnapshot, SecondaryMetrics};
use crate::verdict::{fuse, CombinedVerdict};

const TRENDING_SAMPLE: usize = 5;

/// Token identity and headline market numbers carried alongside a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub contract_address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: f64,
    pub price_change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
    pub dex_name: Option<String>,
    pub pair_address: Option<String>,
}

impl From<&MarketSnapshot> for TokenSummary {
    fn from(s: &MarketSnapshot) -> Self {
        Self {
            contract_address: s.contract_address.clone(),
            name: s.name.clone(),
            symbol: s.symbol.clone(),
            price_usd: s.price_usd,
            price_change_24h: s.price_changes.h24,
            volume_24h: s.volumes.h24,
            liquidity_usd: s.liquidity_usd,
            fdv: s.fdv,
            market_cap: s.market_cap,
            dex_name: s.dex_name.clone(),
            pair_address: s.pair_address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub token: TokenSummary,
    pub verdict: CombinedVerdict,
    /// Unix seconds.
    pub analyzed_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub sol_price_usd: Option<f64>,
    pub trending_tokens: usize,
    pub trending_sample: Vec<TrendingToken>,
    pub timestamp: String,
}

/// The scoring core: synthesize history, run the three scorers, fuse.
/// Pure and synchronous; the snapshot must already carry a current price.
pub fn evaluate(snapshot: &MarketSnapshot, secondary: Option<&SecondaryMetrics>) -> CombinedVerdict {
    let changes = snapshot.price_changes;
    let prices = history::synthesize(Some(snapshot.price_usd), &changes);

    let technical = technical::analyze(&prices, None, Some(snapshot.price_usd), Some(&changes));
    let fundamental = fundamental::analyze(snapshot, secondary);
    let sentiment = sentiment::analyze(snapshot, secondary, Some(&changes));

    fuse(technical, fundamental, sentiment)
}

/// Fetch, score and (optionally) narrate tokens.
pub struct Analyst {
    dexscreener: DexScreenerClient,
    coingecko: CoinGeckoClient,
    narrative: NarrativeClient,
    persona: Option<Persona>,
    concurrency: usize,
}

impl Analyst {
    pub fn new(cfg: &Config) -> Result<Self> {
        let persona = match Persona::load(&cfg.persona_path) {
            Ok(p) => {
                info!(version = %p.version, "loaded narrative persona");
                Some(p)
            }
            Err(e) => {
                warn!(path = %cfg.persona_path.display(), error = %e, "persona unavailable, narrative step disabled");
                None
            }
        };

        let narrative = NarrativeClient::new(cfg)?;
        if !narrative.is_enabled() {
            info!("LLM_API_KEY not set, narrative step will report as unavailable");
        }

        Ok(Self {
            dexscreener: DexScreenerClient::new(cfg)?,
            coingecko: CoinGeckoClient::new(cfg)?,
            narrative,
            persona,
            concurrency: cfg.analyze_concurrency.max(1),
        })
    }

    pub async fn analyze(&self, address: &str, include_narrative: bool) -> Result<AnalysisReport> {
        if !is_valid_solana_address(address) {
            return Err(AppError::InvalidAddress(address.to_string()));
        }

        let (snapshot, secondary) = tokio::join!(
            self.dexscreener.fetch_snapshot(address),
            self.coingecko.secondary_metrics(address),
        );
        let snapshot = snapshot?;
        let secondary = secondary.unwrap_or_else(|e| {
            warn!(address, error = %e, "secondary metrics unavailable");
            None
        });
        if secondary.is_none() {
            info!(address, "scoring from primary snapshot only");
        }

        let mut verdict = evaluate(&snapshot, secondary.as_ref());
        info!(
            address,
            combined = verdict.combined_score,
            verdict = %verdict.verdict,
            strength = verdict.strength,
            "numeric verdict"
        );

        if include_narrative {
            let outcome = match &self.persona {
                Some(persona) => {
                    let prompt = NarrativePrompt::new(&snapshot, &verdict);
                    self.narrative.generate(persona, &prompt).await
                }
                None => Err(NarrativeError::Disabled("no persona loaded".to_string())),
            };
            verdict = verdict.with_narrative(outcome);
        }

        Ok(AnalysisReport {
            token: TokenSummary::from(&snapshot),
            verdict,
            analyzed_at: clock::now_secs(),
        })
    }

    /// Analyze several tokens with bounded concurrency. Results come back in
    /// input order; one failure never aborts the rest.
    pub async fn analyze_many(
        &self,
        addresses: &[String],
        include_narrative: bool,
    ) -> Vec<(String, Result<AnalysisReport>)> {
        stream::iter(addresses.iter().cloned())
            .map(|address| async move {
                let result = self.analyze(&address, include_narrative).await;
                if let Err(e) = &result {
                    warn!(address = %address, error = %e, "analysis failed");
                }
                (address, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn market_overview(&self) -> Result<MarketOverview> {
        let (sol_price, trending) = tokio::join!(self.coingecko.sol_price(), self.dexscreener.trending());
        let sol_price_usd = sol_price.unwrap_or_else(|e| {
            warn!(error = %e, "SOL price unavailable");
            None
        });
        let trending = trending?;

        Ok(MarketOverview {
            sol_price_usd,
            trending_tokens: trending.len(),
            trending_sample: trending.into_iter().take(TRENDING_SAMPLE).collect(),
            timestamp: clock::format_unix_secs_iso(clock::now_secs()),
        })
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let mut hits = self.dexscreener.search(query).await?;
        hits.truncate(limit);
        Ok(hits)
    }
}
