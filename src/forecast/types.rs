use crate::core::types::TokenOutcome;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome the model predicts for the market question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
    Uncertain,
}

impl Outcome {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "YES" => Some(Outcome::Yes),
            "NO" => Some(Outcome::No),
            "UNCERTAIN" => Some(Outcome::Uncertain),
            _ => None,
        }
    }

    /// Token whose price the forecast is compared against. UNCERTAIN has no
    /// direction of its own and is read on the YES axis.
    pub fn price_axis(self) -> TokenOutcome {
        match self {
            Outcome::No => TokenOutcome::No,
            Outcome::Yes | Outcome::Uncertain => TokenOutcome::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Yes => "YES",
            Outcome::No => "NO",
            Outcome::Uncertain => "UNCERTAIN",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "HIGH" => Some(QualityTier::High),
            "MEDIUM" => Some(QualityTier::Medium),
            "LOW" => Some(QualityTier::Low),
            _ => None,
        }
    }
}

/// How a variant asks the model to grade its input data. The validator only
/// accepts the representation the variant declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQualityKind {
    #[default]
    Tier,
    Score,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataQuality {
    Tier(QualityTier),
    Score(#[serde(with = "rust_decimal::serde::float")] Decimal),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForecastSchema {
    pub data_quality: DataQualityKind,
}

/// A model forecast that passed every structural and range check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub outcome: Outcome,
    /// 0..=100
    #[serde(with = "rust_decimal::serde::float")]
    pub probability: Decimal,
    /// 0..=100
    #[serde(with = "rust_decimal::serde::float")]
    pub confidence: Decimal,
    pub outcome_reasoning: String,
    pub confidence_reasoning: String,
    pub key_factors: Vec<String>,
    pub data_quality: DataQuality,
    pub last_updated: DateTime<Utc>,
}

impl Forecast {
    /// Probability as a price in [0,1].
    pub fn probability_fraction(&self) -> Decimal {
        self.probability / Decimal::ONE_HUNDRED
    }
}
