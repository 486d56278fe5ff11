use crate::config::config::AppCfg;
use crate::core::error::PipelineError;
use crate::experiment::variant::{ForecastVariant, LlmVariant, ResearchPair};
use crate::llm::client::CompletionClient;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub type VariantLoader = Box<dyn Fn() -> anyhow::Result<Arc<dyn ForecastVariant>> + Send + Sync>;

struct Entry {
    enabled: bool,
    loader: VariantLoader,
}

/// Every variant the process knows about. Built once at startup and never
/// modified afterwards.
#[derive(Default)]
pub struct ExperimentTable {
    entries: BTreeMap<String, Entry>,
}

impl ExperimentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, id: impl Into<String>, enabled: bool, loader: VariantLoader) -> Self {
        self.entries.insert(id.into(), Entry { enabled, loader });
        self
    }

    /// One entry per configured experiment. Research-backed variants fail to
    /// load when no research providers were supplied.
    pub fn from_config(
        cfg: &AppCfg,
        completion: Arc<dyn CompletionClient>,
        research: Option<ResearchPair>,
    ) -> Self {
        let mut table = Self::new();
        for exp in &cfg.experiments {
            let exp_cfg = exp.clone();
            let llm_cfg = cfg.llm.clone();
            let completion = completion.clone();
            let research = research.clone();

            let loader: VariantLoader = Box::new(move || {
                let pair = if exp_cfg.research {
                    let pair = research.clone().ok_or_else(|| {
                        anyhow::anyhow!("research providers are not configured")
                    })?;
                    Some(pair)
                } else {
                    None
                };
                let variant = LlmVariant::new(&exp_cfg, &llm_cfg, completion.clone(), pair);
                Ok(Arc::new(variant) as Arc<dyn ForecastVariant>)
            });

            info!(
                variant = %exp.id,
                enabled = exp.enabled,
                research = exp.research,
                "Registered experiment"
            );
            table = table.with_variant(exp.id.clone(), exp.enabled, loader);
        }
        table
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<dyn ForecastVariant>, PipelineError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| PipelineError::UnknownVariant(id.to_string()))?;
        if !entry.enabled {
            return Err(PipelineError::VariantDisabled(id.to_string()));
        }
        (entry.loader)().map_err(|source| PipelineError::VariantLoad {
            variant: id.to_string(),
            source,
        })
    }
}
