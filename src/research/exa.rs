use crate::config::config::ProviderCfg;
use crate::research::client::{ResearchItem, ResearchProvider, truncate_snippet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    text: Option<String>,
}

impl From<ExaResult> for ResearchItem {
    fn from(r: ExaResult) -> Self {
        ResearchItem {
            title: r.title.unwrap_or_default(),
            url: r.url,
            snippet: truncate_snippet(r.text.as_deref().unwrap_or_default()),
        }
    }
}

pub struct ExaProvider {
    client: Client,
    cfg: ProviderCfg,
}

impl ExaProvider {
    pub fn new(cfg: ProviderCfg, client: Client) -> Self {
        Self { client, cfg }
    }
}

#[async_trait]
impl ResearchProvider for ExaProvider {
    fn name(&self) -> &str {
        "exa"
    }

    async fn search(&self, query: &str) -> Result<Vec<ResearchItem>> {
        let url = format!("{}/search", self.cfg.base_url.trim_end_matches('/'));
        let body = json!({
            "query": query,
            "numResults": self.cfg.max_results,
            "contents": { "text": true },
        });

        let res = self
            .client
            .post(&url)
            .header("x-api-key", &self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .context("exa request failed")?;

        if !res.status().is_success() {
            anyhow::bail!("Exa API error: {}", res.status());
        }

        let resp: ExaResponse = res.json().await.context("parsing exa response")?;
        Ok(resp.results.into_iter().map(ResearchItem::from).collect())
    }
}
