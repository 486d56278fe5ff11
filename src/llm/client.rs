use crate::config::config::LlmCfg;
use crate::core::types::{CompletionRequest, RawCompletion};
use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::info;

/// Anything that turns a chat request into a single text blob.
#[async_trait]
pub trait CompletionClient: Send + Sync + 'static {
    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    cfg: LlmCfg,
    // Shared between clones so every caller draws from the same quota.
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    pub fn new(cfg: LlmCfg, client: Client) -> Self {
        let rpm = NonZeroU32::new(cfg.rate_limit_rpm).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Self {
            client,
            cfg,
            limiter,
        }
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    pub fn temperature(&self) -> f32 {
        self.cfg.temperature
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

fn first_content(resp: ChatResponse) -> Result<String> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .context("No choices in LLM response")?;
    choice.message.content.context("No content in LLM response")
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        self.limiter.until_ready().await;

        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });

        let url = self.completions_url();
        info!("Calling LLM at {} with model {}", url, request.model);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error {}: {}", status, err_text);
        }

        let resp: ChatResponse = res.json().await.context("decoding LLM response")?;
        Ok(RawCompletion(first_content(resp)?))
    }
}
