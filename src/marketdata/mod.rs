pub mod client;
pub mod polymarket;
#[cfg(test)]
pub mod simulator;

pub use client::MarketDataClient;
pub use polymarket::PolyMarketDataClient;
