use crate::core::error::PipelineError;
use crate::core::types::{MarketSnapshot, TradePlan};
use crate::experiment::table::ExperimentTable;
use crate::forecast::parser::parse_completion;
use crate::forecast::types::Forecast;
use crate::forecast::validator::{ForecastValidator, inject_timestamp_if_missing};
use crate::strategy::divergence::{Divergence, compute_divergence};
use crate::strategy::take_profit::TakeProfitStrategy;
use crate::strategy::types::{Rejection, StrategyDecision, StrategyInput};
use chrono::Utc;
use tracing::{debug, info};

/// What a successful run produced. A skipped trade is still a success.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Trade {
        forecast: Forecast,
        divergence: Divergence,
        plan: TradePlan,
    },
    NoTrade {
        forecast: Forecast,
        divergence: Divergence,
        rejection: Rejection,
    },
}

impl PipelineOutcome {
    pub fn forecast(&self) -> &Forecast {
        match self {
            PipelineOutcome::Trade { forecast, .. } | PipelineOutcome::NoTrade { forecast, .. } => {
                forecast
            }
        }
    }

    pub fn divergence(&self) -> &Divergence {
        match self {
            PipelineOutcome::Trade { divergence, .. }
            | PipelineOutcome::NoTrade { divergence, .. } => divergence,
        }
    }

    pub fn plan(&self) -> Option<&TradePlan> {
        match self {
            PipelineOutcome::Trade { plan, .. } => Some(plan),
            PipelineOutcome::NoTrade { .. } => None,
        }
    }
}

/// Key every record of one (variant, market) evaluation is stored under.
/// `run_id` is fixed per process invocation, so a replay within a run is
/// deduplicated while later runs get their own rows.
pub fn job_id(run_id: &str, variant: &str, market_id: &str) -> String {
    format!("{}:{}:{}", run_id, variant, market_id)
}

pub struct Dispatcher {
    table: ExperimentTable,
    strategy: TakeProfitStrategy,
    inject_missing_timestamp: bool,
}

impl Dispatcher {
    pub fn new(table: ExperimentTable, strategy: TakeProfitStrategy) -> Self {
        Self {
            table,
            strategy,
            inject_missing_timestamp: true,
        }
    }

    pub fn with_timestamp_injection(mut self, enabled: bool) -> Self {
        self.inject_missing_timestamp = enabled;
        self
    }

    pub fn table(&self) -> &ExperimentTable {
        &self.table
    }

    /// Generates a forecast for `market` with `variant_id` and turns it into a
    /// trade decision.
    pub async fn run(
        &self,
        variant_id: &str,
        market: &MarketSnapshot,
    ) -> Result<PipelineOutcome, PipelineError> {
        let variant = self.table.resolve(variant_id)?;

        if market.closed {
            return Err(PipelineError::InvalidInput(format!(
                "market {} is closed",
                market.market_id
            )));
        }

        let raw = variant
            .generate(market)
            .await
            .map_err(|source| PipelineError::Completion {
                variant: variant_id.to_string(),
                source,
            })?;
        debug!(variant = variant_id, chars = raw.as_str().len(), "Completion received");

        let mut payload = parse_completion(&raw)?;
        if self.inject_missing_timestamp {
            inject_timestamp_if_missing(&mut payload, Utc::now());
        }
        let forecast = ForecastValidator::new(variant.schema()).validate(payload)?;

        let divergence = compute_divergence(market, &forecast)?;
        info!(
            market_id = %market.market_id,
            variant = variant_id,
            outcome = %forecast.outcome,
            probability = %forecast.probability,
            confidence = %forecast.confidence,
            delta_percent = %divergence.delta_percent(),
            "Forecast validated"
        );

        let input = StrategyInput::new(market, &forecast, &divergence);
        let outcome = match self.strategy.evaluate(&input)? {
            StrategyDecision::Trade(plan) => PipelineOutcome::Trade {
                forecast,
                divergence,
                plan,
            },
            StrategyDecision::Skip(rejection) => PipelineOutcome::NoTrade {
                forecast,
                divergence,
                rejection,
            },
        };
        Ok(outcome)
    }
}
