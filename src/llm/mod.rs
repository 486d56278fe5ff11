pub mod client;
pub mod prompt;
#[cfg(test)]
pub mod simulator;

pub use client::{CompletionClient, LlmClient};
