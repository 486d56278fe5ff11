use crate::core::error::PipelineError;
use crate::forecast::types::{
    DataQuality, DataQualityKind, Forecast, ForecastSchema, Outcome, QualityTier,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

pub const MIN_REASONING_CHARS: usize = 10;

const OUTCOME: &str = "outcome";
const PROBABILITY: &str = "probability";
const CONFIDENCE: &str = "confidence";
const OUTCOME_REASONING: &str = "outcomeReasoning";
const CONFIDENCE_REASONING: &str = "confidenceReasoning";
const KEY_FACTORS: &str = "keyFactors";
const DATA_QUALITY: &str = "dataQuality";
const LAST_UPDATED: &str = "lastUpdated";

/// One violated constraint. Validation reports all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} has unsupported value '{value}'")]
    NotAllowed { field: &'static str, value: String },
    #[error("{field} = {value} is outside [0, 100]")]
    OutOfRange { field: &'static str, value: String },
    #[error("{field} must have at least {min} characters, got {actual}")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
    #[error("{field} must contain at least one entry")]
    Empty { field: &'static str },
    #[error("{field} entry {index} must be a non-blank string")]
    BadEntry { field: &'static str, index: usize },
    #[error("{field} '{value}' is not an ISO-8601 timestamp")]
    BadTimestamp { field: &'static str, value: String },
}

/// Checks a decoded completion against the forecast schema.
pub struct ForecastValidator {
    schema: ForecastSchema,
}

impl ForecastValidator {
    pub fn new(schema: ForecastSchema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, payload: Value) -> Result<Forecast, PipelineError> {
        let Some(obj) = payload.as_object() else {
            return Err(PipelineError::Validation {
                payload,
                violations: vec![Violation::NotAnObject],
            });
        };

        let mut violations = Vec::new();

        let outcome = check_outcome(obj, &mut violations);
        let probability = check_percentage(obj, PROBABILITY, &mut violations);
        let confidence = check_percentage(obj, CONFIDENCE, &mut violations);
        let outcome_reasoning = check_reasoning(obj, OUTCOME_REASONING, &mut violations);
        let confidence_reasoning = check_reasoning(obj, CONFIDENCE_REASONING, &mut violations);
        let key_factors = check_key_factors(obj, &mut violations);
        let data_quality = match self.schema.data_quality {
            DataQualityKind::Tier => check_tier(obj, &mut violations),
            DataQualityKind::Score => {
                check_percentage(obj, DATA_QUALITY, &mut violations).map(DataQuality::Score)
            }
        };
        let last_updated = check_timestamp(obj, &mut violations);

        match (
            outcome,
            probability,
            confidence,
            outcome_reasoning,
            confidence_reasoning,
            key_factors,
            data_quality,
            last_updated,
        ) {
            (
                Some(outcome),
                Some(probability),
                Some(confidence),
                Some(outcome_reasoning),
                Some(confidence_reasoning),
                Some(key_factors),
                Some(data_quality),
                Some(last_updated),
            ) if violations.is_empty() => Ok(Forecast {
                outcome,
                probability,
                confidence,
                outcome_reasoning,
                confidence_reasoning,
                key_factors,
                data_quality,
                last_updated,
            }),
            _ => Err(PipelineError::Validation {
                payload,
                violations,
            }),
        }
    }
}

/// camelCase name first, snake_case alias second.
fn lookup<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Option<&'a Value> {
    obj.get(field)
        .or_else(|| obj.get(&to_snake_case(field)))
        .filter(|v| !v.is_null())
}

fn to_snake_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Value> {
    let v = lookup(obj, field);
    if v.is_none() {
        violations.push(Violation::Missing { field });
    }
    v
}

fn check_outcome(obj: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<Outcome> {
    let v = required(obj, OUTCOME, violations)?;
    let Some(tag) = v.as_str() else {
        violations.push(Violation::WrongType {
            field: OUTCOME,
            expected: "one of YES, NO, UNCERTAIN",
        });
        return None;
    };
    let outcome = Outcome::parse(tag);
    if outcome.is_none() {
        violations.push(Violation::NotAllowed {
            field: OUTCOME,
            value: tag.to_string(),
        });
    }
    outcome
}

fn check_percentage(
    obj: &Map<String, Value>,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<Decimal> {
    let v = required(obj, field, violations)?;
    let Value::Number(n) = v else {
        violations.push(Violation::WrongType {
            field,
            expected: "a number",
        });
        return None;
    };

    // Go through the literal so 70.1 stays 70.1 instead of its f64 neighbour.
    let literal = n.to_string();
    let Ok(value) = Decimal::from_str(&literal).or_else(|_| Decimal::from_scientific(&literal))
    else {
        violations.push(Violation::OutOfRange {
            field,
            value: literal,
        });
        return None;
    };

    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        violations.push(Violation::OutOfRange {
            field,
            value: literal,
        });
        return None;
    }
    Some(value.normalize())
}

fn check_reasoning(
    obj: &Map<String, Value>,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let v = required(obj, field, violations)?;
    let Some(text) = v.as_str() else {
        violations.push(Violation::WrongType {
            field,
            expected: "a string",
        });
        return None;
    };
    let actual = text.trim().chars().count();
    if actual < MIN_REASONING_CHARS {
        violations.push(Violation::TooShort {
            field,
            min: MIN_REASONING_CHARS,
            actual,
        });
        return None;
    }
    Some(text.to_string())
}

fn check_key_factors(
    obj: &Map<String, Value>,
    violations: &mut Vec<Violation>,
) -> Option<Vec<String>> {
    let v = required(obj, KEY_FACTORS, violations)?;
    let Some(items) = v.as_array() else {
        violations.push(Violation::WrongType {
            field: KEY_FACTORS,
            expected: "a list of strings",
        });
        return None;
    };
    if items.is_empty() {
        violations.push(Violation::Empty { field: KEY_FACTORS });
        return None;
    }

    let mut factors = Vec::with_capacity(items.len());
    let mut ok = true;
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) if !s.trim().is_empty() => factors.push(s.to_string()),
            _ => {
                violations.push(Violation::BadEntry {
                    field: KEY_FACTORS,
                    index,
                });
                ok = false;
            }
        }
    }
    ok.then_some(factors)
}

fn check_tier(obj: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<DataQuality> {
    let v = required(obj, DATA_QUALITY, violations)?;
    let Some(tag) = v.as_str() else {
        violations.push(Violation::WrongType {
            field: DATA_QUALITY,
            expected: "one of HIGH, MEDIUM, LOW",
        });
        return None;
    };
    match QualityTier::parse(tag) {
        Some(tier) => Some(DataQuality::Tier(tier)),
        None => {
            violations.push(Violation::NotAllowed {
                field: DATA_QUALITY,
                value: tag.to_string(),
            });
            None
        }
    }
}

fn check_timestamp(
    obj: &Map<String, Value>,
    violations: &mut Vec<Violation>,
) -> Option<DateTime<Utc>> {
    let v = required(obj, LAST_UPDATED, violations)?;
    let Some(text) = v.as_str() else {
        violations.push(Violation::WrongType {
            field: LAST_UPDATED,
            expected: "an ISO-8601 string",
        });
        return None;
    };
    let parsed = parse_iso8601(text);
    if parsed.is_none() {
        violations.push(Violation::BadTimestamp {
            field: LAST_UPDATED,
            value: text.to_string(),
        });
    }
    parsed
}

/// RFC 3339 first; naive date-times and bare dates are taken as UTC.
pub fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Sets `lastUpdated` to `now` when the model left it out. The pipeline decides
/// whether to call this; the validator itself never fills gaps.
pub fn inject_timestamp_if_missing(payload: &mut Value, now: DateTime<Utc>) {
    if let Some(obj) = payload.as_object_mut() {
        if lookup(obj, LAST_UPDATED).is_none() {
            obj.insert(
                LAST_UPDATED.to_string(),
                Value::String(now.to_rfc3339()),
            );
        }
    }
}
