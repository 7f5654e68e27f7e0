//! PostgreSQL implementation of the document store.
//!
//! Each document is one row of the `documents` table with its body stored
//! as JSONB. Collections exist implicitly while they hold at least one row.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{DocumentStore, FindFilter};
use crate::config::GatewayConfig;
use crate::domain::collection_rules::document_in_range;
use crate::domain::document::{strip_id, with_id};
use crate::domain::{Document, DocumentId, GroupTotal};
use crate::error::GatewayError;

/// PostgreSQL-backed document store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database settings in `config` and applies the
    /// bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the database cannot be
    /// reached or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(format!("migration failed: {e}")))?;

        tracing::info!("connected to postgres document store");
        Ok(Self::new(pool))
    }
}

/// Rebuilds an API document from a stored `(id, body)` row.
fn row_to_document(id: Uuid, body: &Value) -> Document {
    match body {
        Value::Object(map) => with_id(DocumentId::from_uuid(id), map),
        _ => with_id(DocumentId::from_uuid(id), &Document::new()),
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn list_collection_names(&self) -> Result<Vec<String>, GatewayError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT collection FROM documents ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn find(
        &self,
        collection: &str,
        filter: FindFilter<'_>,
    ) -> Result<Vec<Document>, GatewayError> {
        // Timestamp formats vary per document, so date filtering happens
        // here rather than in SQL; the limit is pushed down only when no
        // date filter applies.
        let sql_limit = match (filter.date, filter.limit) {
            (None, Some(limit)) => i64::try_from(limit).unwrap_or(i64::MAX),
            _ => i64::MAX,
        };

        let rows = sqlx::query_as::<_, (Uuid, Value)>(
            "SELECT id, body FROM documents WHERE collection = $1 ORDER BY seq ASC LIMIT $2",
        )
        .bind(collection)
        .bind(sql_limit)
        .fetch_all(&self.pool)
        .await?;

        let docs = rows.into_iter().filter(|(_, body)| match (&filter.date, body) {
            (Some((field, range)), Value::Object(map)) => document_in_range(map, field, range),
            (Some(_), _) => false,
            (None, _) => true,
        });

        Ok(docs
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(id, body)| row_to_document(id, &body))
            .collect())
    }

    async fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, GatewayError> {
        let id = DocumentId::new();
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(*id.as_uuid())
            .bind(Value::Object(strip_id(body)))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        partial: &Document,
    ) -> Result<bool, GatewayError> {
        // `||` merges top-level keys, leaving unmentioned fields untouched.
        let result =
            sqlx::query("UPDATE documents SET body = body || $3 WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(*id.as_uuid())
                .bind(Value::Object(strip_id(partial.clone())))
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, GatewayError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: &str) -> Result<u64, GatewayError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE collection = $1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn top_groups(
        &self,
        collection: &str,
        group_field: &str,
        sum_field: &str,
        limit: usize,
    ) -> Result<Vec<GroupTotal>, GatewayError> {
        // A missing key and an explicit JSON null fall into the same group.
        let rows = sqlx::query_as::<_, (Value, f64)>(
            "SELECT COALESCE(body -> $2, 'null'::jsonb) AS grp, \
                    SUM(CASE WHEN jsonb_typeof(body -> $3) = 'number' \
                             THEN (body ->> $3)::float8 ELSE 0 END)::float8 AS total \
             FROM documents WHERE collection = $1 \
             GROUP BY 1 \
             ORDER BY total DESC, MIN(seq) ASC \
             LIMIT $4",
        )
        .bind(collection)
        .bind(group_field)
        .bind(sum_field)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, total)| GroupTotal { key, total })
            .collect())
    }
}
