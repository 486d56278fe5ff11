use crate::core::types::MarketSnapshot;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataClient: Send + Sync + 'static {
    async fn fetch_market(&self, market_id: &str) -> Result<MarketSnapshot>;
}
