pub mod dispatcher;
pub mod table;
pub mod variant;

pub use dispatcher::{Dispatcher, PipelineOutcome, job_id};
pub use table::{ExperimentTable, VariantLoader};
pub use variant::{ForecastVariant, LlmVariant, ResearchPair};
