pub mod parser;
pub mod types;
pub mod validator;

pub use parser::parse_completion;
pub use types::{DataQuality, DataQualityKind, Forecast, ForecastSchema, Outcome, QualityTier};
pub use validator::{ForecastValidator, Violation};
