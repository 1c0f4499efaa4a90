use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use token_verdict::analyst::Analyst;
use token_verdict::config::Config;
use token_verdict::error::{AppError, Result};
use token_verdict::export::{write_json, ExportRecord};
use token_verdict::fetcher::is_valid_solana_address;
use token_verdict::report::{format_usd, render_text};

/// Score Solana tokens from market data and fuse the scores into a verdict.
#[derive(Debug, Parser)]
#[command(name = "verdict", version, about = "Multi-signal token verdicts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a single token by contract address.
    Analyze {
        address: String,
        /// Print the export record as JSON instead of the text report.
        #[arg(long)]
        json: bool,
        /// Skip the narrative model step.
        #[arg(long)]
        no_narrative: bool,
        /// Narrative model API key (overrides LLM_API_KEY).
        #[arg(long)]
        api_key: Option<String>,
        /// Also write the result to this JSON file.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Analyze several tokens with bounded concurrency.
    Batch {
        #[arg(required = true)]
        addresses: Vec<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        export: Option<PathBuf>,
        /// Run the narrative step for every token.
        #[arg(long)]
        narrative: bool,
    },
    /// SOL price and currently boosted tokens.
    Market {
        #[arg(long)]
        json: bool,
    },
    /// Search tokens on the configured chain.
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut cfg: Config) -> Result<()> {
    match cli.command {
        Command::Analyze { address, json, no_narrative, api_key, export } => {
            if !is_valid_solana_address(&address) {
                return Err(AppError::InvalidAddress(address));
            }
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                cfg.llm_api_key = Some(key);
            }

            let analyst = Analyst::new(&cfg)?;
            let report = analyst.analyze(&address, !no_narrative).await?;
            let record = ExportRecord::from_report(&report);

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print!("{}", render_text(&report));
            }
            if let Some(path) = export {
                write_json(&path, &[record])?;
            }
        }

        Command::Batch { addresses, json, export, narrative } => {
            let analyst = Analyst::new(&cfg)?;
            let total = addresses.len();
            let results = analyst.analyze_many(&addresses, narrative).await;

            let mut records = Vec::with_capacity(total);
            for (address, result) in results {
                match result {
                    Ok(report) => {
                        if !json {
                            print!("{}", render_text(&report));
                            println!();
                        }
                        records.push(ExportRecord::from_report(&report));
                    }
                    Err(e) => eprintln!("✗ {address}: {e}"),
                }
            }
            info!(analyzed = records.len(), total, "batch complete");

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            if let Some(path) = export {
                write_json(&path, &records)?;
            }
            if records.is_empty() {
                return Err(AppError::TokenNotFound(format!("none of {total} tokens could be analyzed")));
            }
        }

        Command::Market { json } => {
            let analyst = Analyst::new(&cfg)?;
            let overview = analyst.market_overview().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                println!("SOL: {}", format_usd(overview.sol_price_usd));
                println!("Trending tokens: {}", overview.trending_tokens);
                for token in &overview.trending_sample {
                    println!(
                        "  {}  {}",
                        token.token_address,
                        token.description.as_deref().unwrap_or("")
                    );
                }
                println!("As of {}", overview.timestamp);
            }
        }

        Command::Search { query, limit } => {
            let analyst = Analyst::new(&cfg)?;
            let hits = analyst.search(&query, limit).await?;
            if hits.is_empty() {
                warn!(query = %query, "no matches");
            }
            for hit in &hits {
                println!(
                    "{:<10} {:<24} {:>16}  liq {:>10}  {}",
                    hit.symbol.as_deref().unwrap_or("?"),
                    hit.name.as_deref().unwrap_or(""),
                    format_usd(hit.price_usd),
                    format_usd(hit.liquidity_usd),
                    hit.address,
                );
            }
        }
    }
    Ok(())
}
