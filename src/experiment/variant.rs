use crate::config::config::{ExperimentCfg, LlmCfg};
use crate::core::types::{CompletionRequest, MarketSnapshot, RawCompletion};
use crate::forecast::types::ForecastSchema;
use crate::llm::client::CompletionClient;
use crate::llm::prompt::forecast_messages;
use crate::research::{ResearchProvider, gather_context};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// One interchangeable way of producing a forecast completion.
#[async_trait]
pub trait ForecastVariant: Send + Sync {
    fn id(&self) -> &str;

    /// Shape the validator must enforce for this variant's output.
    fn schema(&self) -> ForecastSchema;

    async fn generate(&self, market: &MarketSnapshot) -> Result<RawCompletion>;
}

/// Two research sources queried side by side.
#[derive(Clone)]
pub struct ResearchPair {
    pub primary: Arc<dyn ResearchProvider>,
    pub secondary: Arc<dyn ResearchProvider>,
}

/// Single-shot prompt variant, optionally enriched with web research.
pub struct LlmVariant {
    id: String,
    model: String,
    temperature: f32,
    schema: ForecastSchema,
    completion: Arc<dyn CompletionClient>,
    research: Option<ResearchPair>,
}

impl LlmVariant {
    pub fn new(
        exp: &ExperimentCfg,
        llm: &LlmCfg,
        completion: Arc<dyn CompletionClient>,
        research: Option<ResearchPair>,
    ) -> Self {
        Self {
            id: exp.id.clone(),
            model: exp.model.clone().unwrap_or_else(|| llm.model.clone()),
            temperature: exp.temperature.unwrap_or(llm.temperature),
            schema: ForecastSchema {
                data_quality: exp.data_quality,
            },
            completion,
            research,
        }
    }
}

#[async_trait]
impl ForecastVariant for LlmVariant {
    fn id(&self) -> &str {
        &self.id
    }

    fn schema(&self) -> ForecastSchema {
        self.schema
    }

    async fn generate(&self, market: &MarketSnapshot) -> Result<RawCompletion> {
        let context = match &self.research {
            Some(pair) => {
                let ctx = gather_context(&pair.primary, &pair.secondary, &market.question).await;
                info!(
                    items = ctx.items.len(),
                    failed = ?ctx.failed,
                    "Research context ready"
                );
                Some(ctx.render())
            }
            None => None,
        };

        let request = CompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: forecast_messages(
                market,
                context.as_deref(),
                self.schema.data_quality,
                Utc::now(),
            ),
        };
        self.completion.complete(&request).await
    }
}
