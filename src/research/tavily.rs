use crate::config::config::ProviderCfg;
use crate::research::client::{ResearchItem, ResearchProvider, truncate_snippet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl From<TavilyResult> for ResearchItem {
    fn from(r: TavilyResult) -> Self {
        ResearchItem {
            title: r.title,
            url: r.url,
            snippet: truncate_snippet(&r.content),
        }
    }
}

pub struct TavilyProvider {
    client: Client,
    cfg: ProviderCfg,
}

impl TavilyProvider {
    pub fn new(cfg: ProviderCfg, client: Client) -> Self {
        Self { client, cfg }
    }
}

#[async_trait]
impl ResearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str) -> Result<Vec<ResearchItem>> {
        let url = format!("{}/search", self.cfg.base_url.trim_end_matches('/'));
        let body = json!({
            "api_key": self.cfg.api_key,
            "query": query,
            "max_results": self.cfg.max_results,
            "search_depth": "basic",
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("tavily request failed")?;

        if !res.status().is_success() {
            anyhow::bail!("Tavily API error: {}", res.status());
        }

        let resp: TavilyResponse = res.json().await.context("parsing tavily response")?;
        Ok(resp.results.into_iter().map(ResearchItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_results() {
        let resp: TavilyResponse = serde_json::from_str(
            r#"{"query":"q","results":[{"title":"T","url":"https://a","content":"  body  ","score":0.9}]}"#,
        )
        .unwrap();
        let items: Vec<ResearchItem> = resp.results.into_iter().map(ResearchItem::from).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].snippet, "body");
    }
}
