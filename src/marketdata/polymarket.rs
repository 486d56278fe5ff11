use crate::config::config::PolyCfg;
use crate::core::types::{MarketSnapshot, TokenOutcome, TokenPair};
use crate::marketdata::client::MarketDataClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    id: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    closed: bool,
    clob_token_ids: Option<String>,
    outcomes: Option<String>,
    outcome_prices: Option<String>,
}

pub struct PolyMarketDataClient {
    client: Client,
    cfg: PolyCfg,
}

impl PolyMarketDataClient {
    pub fn new(cfg: PolyCfg, client: Client) -> Self {
        Self { client, cfg }
    }

    fn get_market_url(&self, id: &str) -> String {
        format!("{}/{}", self.cfg.gamma_markets_url.trim_end_matches('/'), id)
    }
}

/// Gamma returns the outcome arrays as JSON-encoded strings.
fn decode_list(field: &str, raw: &Option<String>) -> Result<Vec<String>> {
    let raw = raw
        .as_deref()
        .with_context(|| format!("market has no {}", field))?;
    serde_json::from_str(raw).with_context(|| format!("parsing {}: '{}'", field, raw))
}

fn outcome_index(outcomes: &[String], outcome: TokenOutcome) -> Option<usize> {
    outcomes
        .iter()
        .position(|o| o.trim().eq_ignore_ascii_case(outcome.as_str()))
}

fn snapshot_from_gamma(market: GammaMarket) -> Result<MarketSnapshot> {
    let outcomes = decode_list("outcomes", &market.outcomes)?;
    let token_ids = decode_list("clobTokenIds", &market.clob_token_ids)?;

    let (Some(yes_idx), Some(no_idx)) = (
        outcome_index(&outcomes, TokenOutcome::Yes),
        outcome_index(&outcomes, TokenOutcome::No),
    ) else {
        anyhow::bail!(
            "market {} is not a YES/NO market (outcomes: {:?})",
            market.id,
            outcomes
        );
    };

    let (Some(yes_token), Some(no_token)) = (token_ids.get(yes_idx), token_ids.get(no_idx)) else {
        anyhow::bail!(
            "market {} has {} token ids for {} outcomes",
            market.id,
            token_ids.len(),
            outcomes.len()
        );
    };

    // A bad price feed leaves the market without a usable price instead of
    // failing the fetch; divergence reports it.
    let yes_price = match decode_list("outcomePrices", &market.outcome_prices) {
        Ok(prices) => prices
            .get(yes_idx)
            .and_then(|p| Decimal::from_str(p.trim()).ok()),
        Err(e) => {
            warn!("Market {} has unusable prices: {:#}", market.id, e);
            None
        }
    };

    Ok(MarketSnapshot {
        market_id: market.id,
        question: market.question.unwrap_or_default(),
        description: market.description.unwrap_or_default(),
        yes_price,
        closed: market.closed,
        tokens: TokenPair {
            yes: yes_token.clone(),
            no: no_token.clone(),
        },
    })
}

#[async_trait]
impl MarketDataClient for PolyMarketDataClient {
    async fn fetch_market(&self, market_id: &str) -> Result<MarketSnapshot> {
        let url = self.get_market_url(market_id);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("requesting market data")?;

        if !resp.status().is_success() {
            anyhow::bail!("Gamma API error: {}", resp.status());
        }

        let market: GammaMarket = resp.json().await.context("parsing market data")?;
        snapshot_from_gamma(market)
    }
}
