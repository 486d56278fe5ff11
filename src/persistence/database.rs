use crate::config::config::DatabaseCfg;
use crate::core::error::PipelineError;
use crate::experiment::dispatcher::PipelineOutcome;
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions, PgQueryResult};
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Records forecasts, plans and failures. Every row is keyed by the job id,
/// so replaying a job within a run never duplicates anything.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(url: &str, cfg: &DatabaseCfg) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
            .connect(url)
            .await
            .context("connecting to postgres")?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS forecasts (
                job_id TEXT PRIMARY KEY,
                variant TEXT NOT NULL,
                market_id TEXT NOT NULL,
                outcome TEXT NOT NULL,
                probability TEXT NOT NULL, -- Decimal stored as text
                confidence TEXT NOT NULL,
                outcome_price TEXT NOT NULL,
                delta TEXT NOT NULL,
                decision TEXT NOT NULL,    -- 'trade' or the rejection kind
                forecast JSONB NOT NULL,
                rejection JSONB,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trade_plans (
                job_id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,      -- derived from inputs, repeats across runs
                market_id TEXT NOT NULL,
                mode TEXT NOT NULL,
                plan JSONB NOT NULL,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_failures (
                job_id TEXT PRIMARY KEY,
                variant TEXT NOT NULL,
                market_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                payload TEXT,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_all(&self.pool)
        .await?;

        info!(
            "Database tables initialized (Postgres). Found tables: {:?}",
            tables.iter().map(|t| &t.0).collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Forecast row plus, for a trade, the plan it produced.
    pub async fn save_outcome(
        &self,
        job_id: &str,
        variant: &str,
        market_id: &str,
        outcome: &PipelineOutcome,
    ) -> Result<()> {
        self.save_forecast(job_id, variant, market_id, outcome).await?;
        if let Some(plan) = outcome.plan() {
            self.save_trade_plan(job_id, market_id, plan).await?;
        }
        Ok(())
    }

    pub async fn save_forecast(
        &self,
        job_id: &str,
        variant: &str,
        market_id: &str,
        outcome: &PipelineOutcome,
    ) -> Result<()> {
        let start = Instant::now();
        let forecast = outcome.forecast();
        let divergence = outcome.divergence();
        let (decision, rejection) = match outcome {
            PipelineOutcome::Trade { .. } => ("trade", None),
            PipelineOutcome::NoTrade { rejection, .. } => {
                (rejection.kind(), Some(serde_json::to_value(rejection)?))
            }
        };

        let res = sqlx::query(
            r#"
            INSERT INTO forecasts (job_id, variant, market_id, outcome, probability, confidence, outcome_price, delta, decision, forecast, rejection)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(variant)
        .bind(market_id)
        .bind(forecast.outcome.as_str())
        .bind(forecast.probability.to_string())
        .bind(forecast.confidence.to_string())
        .bind(divergence.outcome_price.to_string())
        .bind(divergence.delta.to_string())
        .bind(decision)
        .bind(serde_json::to_value(forecast)?)
        .bind(rejection)
        .execute(&self.pool)
        .await;

        record("forecasts", "insert", &res, start);
        let done = res?;
        debug!(job_id, rows = done.rows_affected(), "Forecast stored");
        Ok(())
    }

    pub async fn save_trade_plan(
        &self,
        job_id: &str,
        market_id: &str,
        plan: &crate::core::types::TradePlan,
    ) -> Result<()> {
        let start = Instant::now();
        let res = sqlx::query(
            r#"
            INSERT INTO trade_plans (job_id, plan_id, market_id, mode, plan)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(&plan.plan_id)
        .bind(market_id)
        .bind(plan.mode.as_str())
        .bind(serde_json::to_value(plan)?)
        .execute(&self.pool)
        .await;

        record("trade_plans", "insert", &res, start);
        res?;
        Ok(())
    }

    pub async fn save_failure(
        &self,
        job_id: &str,
        variant: &str,
        market_id: &str,
        err: &PipelineError,
    ) -> Result<()> {
        let start = Instant::now();
        let res = sqlx::query(
            r#"
            INSERT INTO pipeline_failures (job_id, variant, market_id, kind, message, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(variant)
        .bind(market_id)
        .bind(err.kind())
        .bind(err.to_string())
        .bind(err.payload())
        .execute(&self.pool)
        .await;

        record("pipeline_failures", "insert", &res, start);
        res?;
        Ok(())
    }
}

fn record(table: &'static str, op: &'static str, res: &Result<PgQueryResult, sqlx::Error>, start: Instant) {
    let status = if res.is_ok() { "success" } else { "error" };
    metrics::counter!("database_queries_total", "table" => table, "op" => op, "status" => status)
        .increment(1);
    metrics::histogram!("database_query_duration_seconds", "table" => table, "op" => op)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderType, PlanMode, Side, TokenOutcome, TradeLeg, TradePlan};
    use crate::forecast::types::{DataQuality, Forecast, Outcome, QualityTier};
    use crate::strategy::divergence::Divergence;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sqlx::Row;

    async fn connect() -> Database {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        Database::new(&url, &DatabaseCfg::default()).await.unwrap()
    }

    fn outcome(plan_id: &str) -> PipelineOutcome {
        PipelineOutcome::Trade {
            forecast: Forecast {
                outcome: Outcome::Yes,
                probability: dec!(55),
                confidence: dec!(80),
                outcome_reasoning: "reasoning long enough".to_string(),
                confidence_reasoning: "reasoning long enough".to_string(),
                key_factors: vec!["polls".to_string()],
                data_quality: DataQuality::Tier(QualityTier::High),
                last_updated: Utc::now(),
            },
            divergence: Divergence {
                axis: TokenOutcome::Yes,
                outcome_price: dec!(0.5),
                predicted_probability: dec!(0.55),
                delta: dec!(0.05),
            },
            plan: TradePlan {
                plan_id: plan_id.to_string(),
                mode: PlanMode::Paper,
                notes: None,
                trades: vec![TradeLeg {
                    market_token_id: "yes-token".to_string(),
                    outcome: TokenOutcome::Yes,
                    side: Side::Buy,
                    order_type: OrderType::Market,
                    size: dec!(1),
                    price: Some(dec!(0.5)),
                }],
            },
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_outcome_writes_are_idempotent() {
        let db = connect().await;
        let job = format!("test:{}", uuid::Uuid::new_v4());
        let plan_id = uuid::Uuid::new_v4().to_string();
        let out = outcome(&plan_id);

        db.save_outcome(&job, "test", "m1", &out).await.unwrap();
        db.save_outcome(&job, "test", "m1", &out).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n FROM trade_plans WHERE job_id = $1")
            .bind(&job)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        let n: i64 = row.get("n");
        assert_eq!(n, 1);
    }

    #[tokio::test]
    #[ignore]
    async fn test_failure_is_recorded_with_kind() {
        let db = connect().await;
        let job = format!("test:{}", uuid::Uuid::new_v4());
        let err = PipelineError::Parse {
            raw: "nope".to_string(),
            message: "expected value".to_string(),
        };
        db.save_failure(&job, "test", "m1", &err).await.unwrap();

        let row = sqlx::query("SELECT kind, payload FROM pipeline_failures WHERE job_id = $1")
            .bind(&job)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        let kind: String = row.get("kind");
        let payload: Option<String> = row.get("payload");
        assert_eq!(kind, "parse_error");
        assert_eq!(payload.as_deref(), Some("nope"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_later_runs_get_their_own_rows() {
        use crate::experiment::dispatcher::job_id;

        let db = connect().await;
        let market = format!("m-{}", uuid::Uuid::new_v4());
        let plan_id = uuid::Uuid::new_v4().to_string();
        let out = outcome(&plan_id);
        let err = PipelineError::InvalidInput("market is closed".to_string());

        for run in ["run-1", "run-2"] {
            let job = job_id(run, "test", &market);
            db.save_outcome(&job, "test", &market, &out).await.unwrap();
            db.save_failure(&job, "test", &market, &err).await.unwrap();
        }

        for table in ["forecasts", "trade_plans", "pipeline_failures"] {
            let row = sqlx::query(&format!(
                "SELECT COUNT(*) AS n FROM {} WHERE market_id = $1",
                table
            ))
            .bind(&market)
            .fetch_one(&db.pool)
            .await
            .unwrap();
            let n: i64 = row.get("n");
            assert_eq!(n, 2, "{}", table);
        }
    }
}
