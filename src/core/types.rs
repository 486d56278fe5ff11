use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ----------- Market side -----------------

/// A tradable side of a binary market. Each one maps to its own venue token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenOutcome {
    Yes,
    No,
}

impl TokenOutcome {
    pub fn opposite(self) -> Self {
        match self {
            TokenOutcome::Yes => TokenOutcome::No,
            TokenOutcome::No => TokenOutcome::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenOutcome::Yes => "YES",
            TokenOutcome::No => "NO",
        }
    }
}

impl fmt::Display for TokenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub yes: String,
    pub no: String,
}

impl TokenPair {
    pub fn token_for(&self, outcome: TokenOutcome) -> &str {
        match outcome {
            TokenOutcome::Yes => &self.yes,
            TokenOutcome::No => &self.no,
        }
    }
}

/// Point-in-time view of a binary market as reported by the market-data feed.
///
/// `yes_price` is `None` when the feed price could not be used (missing or
/// unparseable). The NO price is always derived, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub yes_price: Option<Decimal>,
    pub closed: bool,
    pub tokens: TokenPair,
}

impl MarketSnapshot {
    /// YES price if it is a usable probability.
    pub fn usable_yes_price(&self) -> Option<Decimal> {
        self.yes_price
            .filter(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE)
    }

    pub fn no_price(&self) -> Option<Decimal> {
        self.usable_yes_price().map(|p| Decimal::ONE - p)
    }

    pub fn price_of(&self, outcome: TokenOutcome) -> Option<Decimal> {
        match outcome {
            TokenOutcome::Yes => self.usable_yes_price(),
            TokenOutcome::No => self.no_price(),
        }
    }
}

// ----------- Completion contract -----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// Unprocessed model output. May wrap the JSON payload in prose or code fences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCompletion(pub String);

impl RawCompletion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawCompletion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RawCompletion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ----------- Trade plan wire format -----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    #[default]
    Paper,
    Live,
}

impl PlanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanMode::Paper => "paper",
            PlanMode::Live => "live",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLeg {
    pub market_token_id: String,
    pub outcome: TokenOutcome,
    pub side: Side,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePlan {
    pub plan_id: String,
    pub mode: PlanMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub trades: Vec<TradeLeg>,
}

impl TradePlan {
    pub fn entry(&self) -> Option<&TradeLeg> {
        self.trades.first()
    }

    pub fn exit(&self) -> Option<&TradeLeg> {
        self.trades.get(1)
    }
}
