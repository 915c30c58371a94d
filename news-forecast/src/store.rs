use crate::traits::ResultSink;
use crate::types::{ExperimentRecord, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Experiment rows persisted in SQLite.
pub struct SqliteResultStore {
    db: SqlitePool,
}

impl SqliteResultStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // one connection so `sqlite::memory:` keeps a single database
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.init_schema().await?;
        info!("Connected result store at {}", database_url);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS experiment_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id TEXT NOT NULL,
                run_id INTEGER NOT NULL,
                analysis_date TEXT NOT NULL,
                company TEXT NOT NULL,
                industry TEXT NOT NULL,
                window_days INTEGER NOT NULL,
                article_count INTEGER NOT NULL,
                price_at_forecast REAL NOT NULL,
                price_7_days_prior REAL,
                recommendation TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                reasoning TEXT NOT NULL,
                raw_prediction TEXT NOT NULL,
                snippet TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn count_for_batch(&self, batch_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM experiment_results WHERE batch_id = ?")
            .bind(batch_id.to_string())
            .fetch_one(&self.db)
            .await?;
        Ok(row.try_get("n")?)
    }

    /// `(run_id, company, recommendation)` of a batch in run order.
    pub async fn list_batch(&self, batch_id: Uuid) -> Result<Vec<(i64, String, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT run_id, company, recommendation
            FROM experiment_results
            WHERE batch_id = ?
            ORDER BY run_id
            "#,
        )
        .bind(batch_id.to_string())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.try_get("run_id")?, row.try_get("company")?, row.try_get("recommendation")?)))
            .collect()
    }
}

#[async_trait]
impl ResultSink for SqliteResultStore {
    async fn append(&self, record: &ExperimentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO experiment_results (
                batch_id, run_id, analysis_date, company, industry, window_days, article_count,
                price_at_forecast, price_7_days_prior, recommendation, sentiment, reasoning,
                raw_prediction, snippet
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.batch_id.to_string())
        .bind(record.run_id as i64)
        .bind(record.analysis_date)
        .bind(&record.company)
        .bind(&record.industry)
        .bind(record.window_days as i64)
        .bind(record.article_count as i64)
        .bind(record.price_at_forecast)
        .bind(record.price_7_days_prior)
        .bind(&record.recommendation)
        .bind(&record.sentiment)
        .bind(&record.reasoning)
        .bind(&record.raw_prediction)
        .bind(&record.snippet)
        .execute(&self.db)
        .await?;

        debug!("Stored run {} of batch {}", record.run_id, record.batch_id);
        Ok(())
    }
}
