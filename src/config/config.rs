use crate::core::types::PlanMode;
use crate::forecast::types::DataQualityKind;
use anyhow::{Context, Result};
use config::{Config, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppCfg {
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub polymarket: PolyCfg,
    #[serde(default)]
    pub llm: LlmCfg,
    #[serde(default)]
    pub research: ResearchCfg,
    #[serde(default)]
    pub strategy: StrategyCfg,
    #[serde(default = "default_experiments")]
    pub experiments: Vec<ExperimentCfg>,
    #[serde(default)]
    pub pipeline: PipelineCfg,
    #[serde(default)]
    pub database: DatabaseCfg,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            http: HttpCfg::default(),
            polymarket: PolyCfg::default(),
            llm: LlmCfg::default(),
            research: ResearchCfg::default(),
            strategy: StrategyCfg::default(),
            experiments: default_experiments(),
            pipeline: PipelineCfg::default(),
            database: DatabaseCfg::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpCfg {
    #[serde(default = "default_ua")]
    pub user_agent: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_idle")]
    pub pool_idle_timeout: Duration,
    #[serde(default = "default_pool")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_ua(),
            timeout: default_timeout(),
            pool_idle_timeout: default_idle(),
            pool_max_idle_per_host: default_pool(),
        }
    }
}
fn default_ua() -> String {
    "polyforecast/0.1".into()
}
fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
fn default_idle() -> Duration {
    Duration::from_secs(90)
}
fn default_pool() -> usize {
    16
}

#[derive(Debug, Deserialize, Clone)]
pub struct PolyCfg {
    pub gamma_markets_url: String,
}

impl Default for PolyCfg {
    fn default() -> Self {
        Self {
            gamma_markets_url: "https://gamma-api.polymarket.com/markets".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmCfg {
    #[serde(default = "default_llm_base")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_rpm")]
    pub rate_limit_rpm: u32,
}

impl Default for LlmCfg {
    fn default() -> Self {
        Self {
            base_url: default_llm_base(),
            api_key: String::new(),
            model: default_model(),
            temperature: 0.0,
            rate_limit_rpm: default_rpm(),
        }
    }
}
fn default_llm_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_rpm() -> u32 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderCfg {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl ProviderCfg {
    pub fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResearchCfg {
    #[serde(default = "default_tavily")]
    pub tavily: ProviderCfg,
    #[serde(default = "default_exa")]
    pub exa: ProviderCfg,
}

impl Default for ResearchCfg {
    fn default() -> Self {
        Self {
            tavily: default_tavily(),
            exa: default_exa(),
        }
    }
}
fn default_tavily() -> ProviderCfg {
    ProviderCfg {
        base_url: "https://api.tavily.com".to_string(),
        api_key: String::new(),
        max_results: default_max_results(),
    }
}
fn default_exa() -> ProviderCfg {
    ProviderCfg {
        base_url: "https://api.exa.ai".to_string(),
        api_key: String::new(),
        max_results: default_max_results(),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyCfg {
    #[serde(default = "default_min_delta")]
    pub min_delta_percent: Decimal,
    #[serde(default = "default_unit_size")]
    pub unit_size: Decimal,
    #[serde(default)]
    pub mode: PlanMode,
}

impl Default for StrategyCfg {
    fn default() -> Self {
        Self {
            min_delta_percent: default_min_delta(),
            unit_size: default_unit_size(),
            mode: PlanMode::Paper,
        }
    }
}
fn default_min_delta() -> Decimal {
    Decimal::new(25, 1)
}
fn default_unit_size() -> Decimal {
    Decimal::ONE
}

/// One row of the experiment table.
#[derive(Debug, Deserialize, Clone)]
pub struct ExperimentCfg {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides `llm.model`.
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides `llm.temperature`.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub research: bool,
    #[serde(default)]
    pub data_quality: DataQualityKind,
}

fn default_true() -> bool {
    true
}

fn default_experiments() -> Vec<ExperimentCfg> {
    vec![
        ExperimentCfg {
            id: "baseline".to_string(),
            enabled: true,
            model: None,
            temperature: None,
            research: false,
            data_quality: DataQualityKind::Tier,
        },
        ExperimentCfg {
            id: "research".to_string(),
            enabled: true,
            model: None,
            temperature: None,
            research: true,
            data_quality: DataQualityKind::Score,
        },
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineCfg {
    #[serde(default = "default_variant")]
    pub variant: String,
    #[serde(default)]
    pub markets: Vec<String>,
    #[serde(default = "default_true")]
    pub inject_missing_timestamp: bool,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            markets: Vec::new(),
            inject_missing_timestamp: true,
        }
    }
}
fn default_variant() -> String {
    "baseline".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseCfg {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl AppCfg {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .context("building config")?;

        let app: AppCfg = cfg.try_deserialize().context("deserializing config")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.polymarket.gamma_markets_url.is_empty(),
            "polymarket.gamma_markets_url missing"
        );
        anyhow::ensure!(!self.llm.base_url.is_empty(), "llm.base_url missing");
        anyhow::ensure!(self.llm.rate_limit_rpm > 0, "llm.rate_limit_rpm must be > 0");
        anyhow::ensure!(
            self.strategy.min_delta_percent >= Decimal::ZERO,
            "strategy.min_delta_percent must be >= 0"
        );
        anyhow::ensure!(
            self.strategy.unit_size > Decimal::ZERO,
            "strategy.unit_size must be > 0"
        );

        let mut seen = HashSet::new();
        for exp in &self.experiments {
            anyhow::ensure!(!exp.id.is_empty(), "experiments[].id must not be empty");
            anyhow::ensure!(
                seen.insert(exp.id.as_str()),
                "duplicate experiment id '{}'",
                exp.id
            );
        }
        Ok(())
    }
}
