use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait ResearchProvider: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn search(&self, query: &str) -> Result<Vec<ResearchItem>>;
}

/// Longest snippet kept per item in the prompt context.
pub const MAX_SNIPPET_CHARS: usize = 600;

pub fn truncate_snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_SNIPPET_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}
