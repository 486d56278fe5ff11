mod config;
mod core;
mod experiment;
mod forecast;
mod llm;
mod marketdata;
mod persistence;
mod research;
mod strategy;

use anyhow::{Context, Result};
use config::config::AppCfg;
use experiment::{Dispatcher, ExperimentTable, PipelineOutcome, ResearchPair, job_id};
use llm::LlmClient;
use marketdata::{MarketDataClient, PolyMarketDataClient};
use persistence::Database;
use reqwest::Client;
use research::{ExaProvider, ResearchProvider, TavilyProvider};
use std::sync::Arc;
use strategy::TakeProfitStrategy;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppCfg::load("config.yml")?;

    // Root span for the supervisor/main thread
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "Supervisor",
        run_id = %run_id,
        pid = %std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
    );
    let _enter = span.enter();

    info!("Starting up");

    info!("Initializing Client");
    let client = Client::builder()
        .user_agent(cfg.http.user_agent.clone())
        .pool_idle_timeout(cfg.http.pool_idle_timeout)
        .pool_max_idle_per_host(cfg.http.pool_max_idle_per_host)
        .timeout(cfg.http.timeout)
        .build()
        .context("building http client")?;

    let markets: Arc<dyn MarketDataClient> = Arc::new(PolyMarketDataClient::new(
        cfg.polymarket.clone(),
        client.clone(),
    ));
    let completion = Arc::new(LlmClient::new(cfg.llm.clone(), client.clone()));
    info!(
        model = completion.model(),
        temperature = completion.temperature(),
        "LLM client ready"
    );

    let research = if cfg.research.tavily.enabled() && cfg.research.exa.enabled() {
        info!("Research providers enabled");
        let primary: Arc<dyn ResearchProvider> =
            Arc::new(TavilyProvider::new(cfg.research.tavily.clone(), client.clone()));
        let secondary: Arc<dyn ResearchProvider> =
            Arc::new(ExaProvider::new(cfg.research.exa.clone(), client.clone()));
        Some(ResearchPair { primary, secondary })
    } else {
        warn!("Research providers not configured, research variants will fail to load");
        None
    };

    info!("Building experiment table");
    let table = ExperimentTable::from_config(&cfg, completion, research);
    let dispatcher = Arc::new(
        Dispatcher::new(table, TakeProfitStrategy::new(&cfg.strategy))
            .with_timestamp_injection(cfg.pipeline.inject_missing_timestamp),
    );
    info!(
        variants = ?dispatcher.table().ids().collect::<Vec<_>>(),
        "Experiment table ready"
    );

    let db = match &cfg.database.url {
        Some(url) => {
            info!("Connecting to database");
            Some(Database::new(url, &cfg.database).await?)
        }
        None => {
            info!("No database configured, results are only logged");
            None
        }
    };

    if cfg.pipeline.markets.is_empty() {
        warn!("pipeline.markets is empty, nothing to do");
        return Ok(());
    }

    info!(
        variant = %cfg.pipeline.variant,
        markets = cfg.pipeline.markets.len(),
        "Spawning market jobs"
    );
    let mut jobs = tokio::task::JoinSet::new();
    for market_id in cfg.pipeline.markets.clone() {
        let variant = cfg.pipeline.variant.clone();
        let span = info_span!("Market", market_id = %market_id, variant = %variant);
        jobs.spawn(
            run_job(
                job_id(&run_id, &variant, &market_id),
                variant,
                market_id,
                markets.clone(),
                dispatcher.clone(),
                db.clone(),
            )
            .instrument(span),
        );
    }

    tokio::select! {
        _ = async {
            while let Some(res) = jobs.join_next().await {
                match res {
                    Ok(Ok(()))  => {}
                    Ok(Err(e))  => error!(?e, "Job returned error"),
                    Err(panic)  => error!(?panic, "Job panicked/cancelled"),
                }
            }
        } => {
            info!("All jobs finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, aborting outstanding jobs");
            jobs.shutdown().await;
        }
    }

    info!("Supervisor exit");
    Ok(())
}

/// One market through one variant. Pipeline failures are recorded, not
/// propagated; only infrastructure errors end the job with `Err`.
async fn run_job(
    job: String,
    variant: String,
    market_id: String,
    markets: Arc<dyn MarketDataClient>,
    dispatcher: Arc<Dispatcher>,
    db: Option<Database>,
) -> Result<()> {
    let snapshot = markets
        .fetch_market(&market_id)
        .await
        .with_context(|| format!("fetching market {}", market_id))?;

    match dispatcher.run(&variant, &snapshot).await {
        Ok(outcome) => {
            match &outcome {
                PipelineOutcome::Trade { plan, .. } => {
                    let wire = serde_json::to_string(plan)?;
                    info!(
                        job = %job,
                        entry = ?plan.entry().and_then(|leg| leg.price),
                        exit = ?plan.exit().and_then(|leg| leg.price),
                        plan = %wire,
                        "Trade plan ready"
                    );
                }
                PipelineOutcome::NoTrade { rejection, .. } => {
                    info!(job = %job, reason = rejection.kind(), "No trade: {}", rejection);
                }
            }
            if let Some(db) = &db {
                db.save_outcome(&job, &variant, &market_id, &outcome).await?;
            }
        }
        Err(e) => {
            warn!(job = %job, kind = e.kind(), "Pipeline failed: {}", e);
            if let Some(db) = &db {
                db.save_failure(&job, &variant, &market_id, &e).await?;
            }
        }
    }
    Ok(())
}
