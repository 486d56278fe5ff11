use crate::core::types::{CompletionRequest, RawCompletion};
use crate::llm::client::CompletionClient;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Returns a fixed completion and remembers what it was asked.
pub struct SimCompletionClient {
    response: String,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl SimCompletionClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionClient for SimCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        self.requests.lock().await.push(request.clone());
        Ok(RawCompletion(self.response.clone()))
    }
}
