use crate::core::types::MarketSnapshot;
use crate::marketdata::client::MarketDataClient;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves snapshots from memory.
#[derive(Default)]
pub struct SimMarketDataClient {
    markets: HashMap<String, MarketSnapshot>,
}

impl SimMarketDataClient {
    pub fn new(markets: impl IntoIterator<Item = MarketSnapshot>) -> Self {
        Self {
            markets: markets
                .into_iter()
                .map(|m| (m.market_id.clone(), m))
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataClient for SimMarketDataClient {
    async fn fetch_market(&self, market_id: &str) -> Result<MarketSnapshot> {
        self.markets
            .get(market_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown simulated market {}", market_id))
    }
}
