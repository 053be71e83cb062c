use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::HistoryStore;
use crate::config::DatabaseConfig;
use crate::identity::Asin;
use crate::models::{PricePoint, ProductRecord, ProductSummary};
use crate::{AppError, Result};

/// SQLite-backed store. Products live in `products`, observations in `price_history`
/// ordered by their autoincrement id.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

fn database_path(url: &str) -> Option<&str> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(path)
    }
}

impl SqliteHistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database and applies migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let file = database_path(&config.url);

        if let Some(parent) = file.and_then(|f| Path::new(f).parent()) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout));

        let mut pool_options = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout));

        if file.is_some() {
            options = options.journal_mode(SqliteJournalMode::Wal);
            pool_options = pool_options.max_connections(config.max_connections);
        } else {
            // every connection to :memory: is its own database; keep exactly one alive
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        info!(url = %config.url, "Connected to database");

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_record(conn: &mut SqliteConnection, asin: &Asin) -> Result<Option<ProductRecord>> {
        let summary: Option<ProductSummary> =
            sqlx::query_as("SELECT asin, title, image FROM products WHERE asin = ?")
                .bind(asin.as_str())
                .fetch_optional(&mut *conn)
                .await?;

        let Some(summary) = summary else {
            return Ok(None);
        };

        let price_history: Vec<PricePoint> = sqlx::query_as(
            "SELECT price, observed_at FROM price_history WHERE asin = ? ORDER BY id",
        )
        .bind(asin.as_str())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(ProductRecord {
            asin: summary.asin,
            title: summary.title,
            image: summary.image,
            price_history,
        }))
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn upsert_observation(
        &self,
        asin: &Asin,
        title: &str,
        image: &str,
        price: i64,
    ) -> Result<ProductRecord> {
        // The first statement writes, so the transaction takes SQLite's write lock
        // immediately and concurrent upserts queue on the busy timeout.
        let mut tx = self.pool.begin().await?;
        let touched_at = Utc::now();

        sqlx::query(
            "INSERT INTO products (asin, title, image, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (asin) DO UPDATE SET
                 title = excluded.title,
                 image = excluded.image,
                 updated_at = excluded.updated_at",
        )
        .bind(asin.as_str())
        .bind(title)
        .bind(image)
        .bind(touched_at)
        .bind(touched_at)
        .execute(&mut *tx)
        .await?;

        // stamped under the write lock so ids and timestamps agree
        let observed_at = Utc::now();

        sqlx::query("INSERT INTO price_history (asin, price, observed_at) VALUES (?, ?, ?)")
            .bind(asin.as_str())
            .bind(price)
            .bind(observed_at)
            .execute(&mut *tx)
            .await?;

        let record = Self::load_record(&mut tx, asin)
            .await?
            .ok_or_else(|| AppError::Internal(format!("product {} vanished during upsert", asin)))?;

        tx.commit().await?;
        debug!(asin = %asin, price, entries = record.price_history.len(), "Stored observation");
        Ok(record)
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let products = sqlx::query_as("SELECT asin, title, image FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_product(&self, asin: &Asin) -> Result<Option<ProductRecord>> {
        let mut tx = self.pool.begin().await?;
        let record = Self::load_record(&mut tx, asin).await?;
        tx.commit().await?;
        Ok(record)
    }
}
