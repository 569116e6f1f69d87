//! SQLite document store.
//!
//! A single `documents` table holds every collection; each row carries the
//! collection name and the JSON body. String equality filters on plain
//! field paths run in SQL through `json_extract`, and when every filter is
//! pushed down the sort and limit run there too. [`StoreQuery::apply`]
//! still makes a final pass, so results match the in-memory store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use steward_core::error::StoreError;
use steward_core::store::{DataStore, Filter, SortOrder, StoreQuery};
use tracing::{debug, info, warn};

use crate::ensure_id;

/// Fields with their own expression index. Queries must spell the
/// expression exactly the same way for the planner to use it.
const INDEXED_FIELDS: [&str; 3] = ["businessId", "userId", "threadId"];

/// Whether a field path can be inlined into a JSON path literal.
fn is_plain_path(field: &str) -> bool {
    !field.is_empty()
        && field.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn json_field(field: &str) -> String {
    format!("json_extract(body, '$.{field}')")
}

/// Build the SQL side of a read. Returns the builder and whether every
/// filter was pushed down (only then are ORDER BY and LIMIT exact).
fn select_for(query: &StoreQuery) -> (QueryBuilder<'_, Sqlite>, bool) {
    let mut builder = QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
    builder.push_bind(query.collection.as_str());

    let mut complete = true;
    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value: Value::String(value) } if is_plain_path(field) => {
                builder.push(format!(" AND {} = ", json_field(field)));
                builder.push_bind(value.as_str());
            }
            _ => complete = false,
        }
    }

    match &query.sort {
        Some((field, order)) if complete && is_plain_path(field) => {
            let expr = json_field(field);
            let direction = match order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            // Missing values last, ties in insertion order
            builder.push(format!(" ORDER BY ({expr} IS NULL), {expr} {direction}, iid"));
        }
        Some(_) => {
            complete = false;
            builder.push(" ORDER BY iid");
        }
        None => {
            builder.push(" ORDER BY iid");
        }
    }

    if complete {
        builder.push(" LIMIT ");
        builder.push_bind(query.limit as i64);
    }
    (builder, complete)
}

/// A SQLite-backed [`DataStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database; it is pinned to a
    /// single connection so every query sees the same schema.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let ephemeral = path.contains(":memory:");
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(if ephemeral { 1 } else { 4 })
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT NOT NULL,
                collection   TEXT NOT NULL,
                body         TEXT NOT NULL,
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("documents table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("collection index: {e}")))?;

        for field in INDEXED_FIELDS {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_documents_{field} ON documents(collection, {})",
                json_field(field)
            ))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("{field} index: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find(&self, query: &StoreQuery) -> Result<Vec<Value>, StoreError> {
        let (mut builder, complete) = select_for(query);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed {
                collection: query.collection.clone(),
                reason: e.to_string(),
            })?;
        debug!(collection = %query.collection, rows = rows.len(), pushed_down = complete, "SQLite read");

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.try_get("body").map_err(|e| StoreError::QueryFailed {
                collection: query.collection.clone(),
                reason: format!("body column: {e}"),
            })?;
            match serde_json::from_str::<Value>(&body) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    warn!(collection = %query.collection, error = %e, "Skipping corrupt document");
                }
            }
        }

        Ok(query.apply(docs))
    }

    async fn insert(&self, collection: &str, mut document: Value) -> Result<String, StoreError> {
        let id = ensure_id(&mut document)?;
        let body = serde_json::to_string(&document)
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        sqlx::query("INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(collection)
            .bind(body)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("insert into {collection}: {e}")))?;

        Ok(id)
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;
        let n: i64 = row.try_get("n").map_err(|e| StoreError::QueryFailed {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}
