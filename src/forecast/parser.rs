//! Completion text -> generic JSON value.
//!
//! Two stages: strip a Markdown code fence if the model wrapped its answer in
//! one, then decode strictly. A `json`-tagged block is preferred over any
//! other fence. Nothing is scraped out of malformed output.

use crate::core::error::PipelineError;
use crate::core::types::RawCompletion;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    // Non-greedy: the first closing fence ends the block.
    static ref JSON_BLOCK: Regex =
        Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n?(.*?)```").expect("valid json fence regex");
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[ \t]*(?i:json)?[ \t]*\r?\n?(.*?)```").expect("valid fence regex");
}

/// Text enclosed by the first `json`-tagged block, else by the first fenced
/// block of any kind, else the whole (trimmed) input.
pub fn strip_fences(text: &str) -> &str {
    let inner = JSON_BLOCK
        .captures(text)
        .or_else(|| FENCED_BLOCK.captures(text))
        .and_then(|c| c.get(1));
    match inner {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

pub fn parse_completion(raw: &RawCompletion) -> Result<Value, PipelineError> {
    let body = strip_fences(raw.as_str());
    serde_json::from_str(body).map_err(|e| PipelineError::Parse {
        raw: raw.as_str().to_string(),
        message: e.to_string(),
    })
}
