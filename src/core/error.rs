use crate::forecast::validator::Violation;
use serde_json::Value;
use thiserror::Error;

/// Terminal failures of a single pipeline invocation. None of them is retried
/// internally; callers decide what to do and record the kind + payload.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("completion is not valid JSON: {message}")]
    Parse { raw: String, message: String },

    #[error("forecast failed validation: {}", join_violations(.violations))]
    Validation {
        payload: Value,
        violations: Vec<Violation>,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    #[error("variant '{0}' is disabled")]
    VariantDisabled(String),

    #[error("variant '{variant}' failed to load: {source:#}")]
    VariantLoad {
        variant: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("variant '{variant}' failed to produce a completion: {source:#}")]
    Completion {
        variant: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("strategy invariant violated: {0}")]
    InvariantViolation(String),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PipelineError {
    /// Stable identifier used when a failure is recorded against a job.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Parse { .. } => "parse_error",
            PipelineError::Validation { .. } => "validation_error",
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::UnknownVariant(_) => "unknown_variant",
            PipelineError::VariantDisabled(_) => "variant_disabled",
            PipelineError::VariantLoad { .. } => "variant_load",
            PipelineError::Completion { .. } => "completion",
            PipelineError::InvariantViolation(_) => "invariant_violation",
        }
    }

    /// Diagnostic payload: the raw completion for parse failures, the decoded
    /// object for validation failures.
    pub fn payload(&self) -> Option<String> {
        match self {
            PipelineError::Parse { raw, .. } => Some(raw.clone()),
            PipelineError::Validation { payload, .. } => Some(payload.to_string()),
            _ => None,
        }
    }
}
