use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    LedgerError, LedgerRecord, Result, RichQuery,
    store::{Ledger, validate_record},
};

/// PostgreSQL-backed ledger implementation.
///
/// Each key is stored as a JSONB document (for selector queries) alongside the
/// exact bytes that were written.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<LedgerRecord> {
        Ok(LedgerRecord {
            key: row.try_get("key")?,
            value: row.try_get("raw")?,
        })
    }

    fn page_bounds(query: &RichQuery) -> Result<(i64, Option<i64>)> {
        let to_i64 = |n: usize| {
            i64::try_from(n)
                .map_err(|_| LedgerError::InvalidQuery(format!("pagination value {n} too large")))
        };
        let offset = to_i64(query.skip.unwrap_or(0))?;
        let limit = query.limit.map(to_i64).transpose()?;
        Ok((offset, limit))
    }

    /// Full scan with the selector evaluated in process.
    async fn scan(&self, query: &RichQuery) -> Result<Vec<LedgerRecord>> {
        let rows = sqlx::query("SELECT key, raw FROM world_state ORDER BY key ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut matched = Vec::new();
        for row in rows {
            let record = Self::row_to_record(row)?;
            if query.matches(&record.document()?)? {
                matched.push(record);
            }
        }
        Ok(query.paginate(matched))
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let raw: Option<Vec<u8>> = sqlx::query_scalar("SELECT raw FROM world_state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(raw)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let document = validate_record(key, &value)?;

        sqlx::query(
            r#"
            INSERT INTO world_state (key, document, raw, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key)
            DO UPDATE SET document = EXCLUDED.document, raw = EXCLUDED.raw, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(&document)
        .bind(&value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, query: &RichQuery) -> Result<Vec<LedgerRecord>> {
        let containment = match query.as_containment() {
            Ok(selector) => selector.clone(),
            Err(LedgerError::UnsupportedQuery(reason)) => {
                tracing::debug!(%reason, "selector not indexable, scanning world state");
                return self.scan(query).await;
            }
            Err(e) => return Err(e),
        };

        let (offset, limit) = Self::page_bounds(query)?;
        let rows = sqlx::query(
            r#"
            SELECT key, raw
            FROM world_state
            WHERE document @> $1
            ORDER BY key ASC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(&containment)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM world_state WHERE key = $1)")
                .bind(key)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
