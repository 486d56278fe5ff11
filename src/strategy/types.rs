use crate::core::types::{MarketSnapshot, TokenPair, TradePlan};
use crate::forecast::types::{Forecast, Outcome};
use crate::strategy::divergence::Divergence;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only view the strategy works from. Prices and the prediction are
/// expressed on the axis of the forecast's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyInput {
    pub market_id: String,
    pub tokens: TokenPair,
    pub outcome: Outcome,
    /// 0..=1
    pub prediction_probability: Decimal,
    /// 0..=1
    pub current_market_price: Decimal,
    /// 0..=100
    pub confidence: Decimal,
}

impl StrategyInput {
    pub fn new(market: &MarketSnapshot, forecast: &Forecast, divergence: &Divergence) -> Self {
        Self {
            market_id: market.market_id.clone(),
            tokens: market.tokens.clone(),
            outcome: forecast.outcome,
            prediction_probability: divergence.predicted_probability,
            current_market_price: divergence.outcome_price,
            confidence: forecast.confidence,
        }
    }

    pub fn delta(&self) -> Decimal {
        (self.current_market_price - self.prediction_probability).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Market prices the predicted outcome below the forecast.
    Underpriced,
    /// Market prices the predicted outcome above the forecast.
    Overpriced,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Underpriced => f.write_str("underpriced"),
            Branch::Overpriced => f.write_str("overpriced"),
        }
    }
}

/// Valid input, no trade. Not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Rejection {
    #[serde(rename_all = "camelCase")]
    BelowThreshold {
        delta_percent: Decimal,
        min_delta_percent: Decimal,
    },
    /// Confidence too low to move the exit off the entry price.
    #[serde(rename_all = "camelCase")]
    NoProfitTarget { entry: Decimal, confidence: Decimal },
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::BelowThreshold { .. } => "below_threshold",
            Rejection::NoProfitTarget { .. } => "no_profit_target",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BelowThreshold {
                delta_percent,
                min_delta_percent,
            } => write!(
                f,
                "delta {}% is below the {}% threshold",
                delta_percent, min_delta_percent
            ),
            Rejection::NoProfitTarget { entry, confidence } => write!(
                f,
                "confidence {} leaves no profit target above entry {}",
                confidence, entry
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyDecision {
    Trade(TradePlan),
    Skip(Rejection),
}
