pub mod client;
pub mod exa;
pub mod tavily;

pub use client::{ResearchItem, ResearchProvider};
pub use exa::ExaProvider;
pub use tavily::TavilyProvider;

use std::sync::Arc;
use tracing::{info, warn};

/// Context merged from every provider that answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchContext {
    pub items: Vec<(String, ResearchItem)>,
    pub failed: Vec<String>,
}

impl ResearchContext {
    /// Bullet list for the prompt.
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|(source, item)| {
                format!(
                    "- [{}] {} ({})\n  {}",
                    source, item.title, item.url, item.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Queries both providers at once and waits for both to settle. A failing
/// provider only thins the context out.
pub async fn gather_context(
    primary: &Arc<dyn ResearchProvider>,
    secondary: &Arc<dyn ResearchProvider>,
    query: &str,
) -> ResearchContext {
    let (first, second) = tokio::join!(primary.search(query), secondary.search(query));

    let mut ctx = ResearchContext::default();
    for (provider, res) in [(primary, first), (secondary, second)] {
        match res {
            Ok(items) => {
                info!(provider = provider.name(), results = items.len(), "Research gathered");
                ctx.items
                    .extend(items.into_iter().map(|i| (provider.name().to_string(), i)));
            }
            Err(e) => {
                warn!(provider = provider.name(), "Research failed: {:#}", e);
                ctx.failed.push(provider.name().to_string());
            }
        }
    }
    ctx
}
