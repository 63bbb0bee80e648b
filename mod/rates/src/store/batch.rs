use std::sync::Arc;

use shiperp_core::{ListParams, ListResult, ServiceError};
use shiperp_sql::{Row, SQLStore, Statement, Value};

use crate::model::{Batch, BatchStatus};

/// SQL schema for the batches table.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS batches (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        country_code TEXT,
        status TEXT NOT NULL,
        source TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_batches_status ON batches(status)",
    "CREATE INDEX IF NOT EXISTS idx_batches_created_at ON batches(created_at)",
];

/// Filters for listing batches.
#[derive(Debug, Default, Clone)]
pub struct BatchFilter {
    pub status: Option<String>,
    pub country: Option<String>,
}

/// Persistent storage for ingestion batches, backed by SQLStore (SQLite).
pub struct BatchStore {
    db: Arc<dyn SQLStore>,
}

impl BatchStore {
    /// Create a new BatchStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(format!("batches schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    /// Build the INSERT statement for a batch. Ingestion persists the
    /// batch and its staged rows in one transaction, so this returns a
    /// Statement instead of executing.
    pub fn insert_stmt(&self, batch: &Batch) -> Result<Statement, ServiceError> {
        let data =
            serde_json::to_string(batch).map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(Statement::new(
            "INSERT INTO batches (id, data, country_code, status, source, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            vec![
                Value::Text(batch.id.clone()),
                Value::Text(data),
                Value::opt_text(&batch.country_code),
                Value::Text(batch.status.as_str().to_string()),
                Value::Text(batch.source.clone()),
                Value::Text(batch.created_at.clone()),
                Value::Text(batch.updated_at.clone()),
            ],
        ))
    }

    /// Get a batch by ID.
    pub fn get(&self, id: &str) -> Result<Batch, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM batches WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("batch {id}")))?;

        row_to_batch(row)
    }

    /// List batches with optional filters, newest first.
    pub fn list(
        &self,
        params: &ListParams,
        filter: &BatchFilter,
    ) -> Result<ListResult<Batch>, ServiceError> {
        let mut where_clauses: Vec<String> = Vec::new();
        let mut sql_params: Vec<Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref s) = filter.status {
            where_clauses.push(format!("status = ?{idx}"));
            sql_params.push(Value::Text(s.clone()));
            idx += 1;
        }
        if let Some(ref c) = filter.country {
            where_clauses.push(format!("country_code = ?{idx}"));
            sql_params.push(Value::Text(c.clone()));
            idx += 1;
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        // Count total
        let count_sql = format!("SELECT COUNT(*) as cnt FROM batches {where_sql}");
        let count_rows = self
            .db
            .query(&count_sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        // Fetch page
        let select_sql = format!(
            "SELECT data FROM batches {where_sql} ORDER BY created_at DESC LIMIT ?{idx} OFFSET ?{}",
            idx + 1
        );
        let mut select_params = sql_params;
        select_params.push(Value::Integer(params.limit.min(500) as i64));
        select_params.push(Value::Integer(params.offset as i64));

        let rows = self
            .db
            .query(&select_sql, &select_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_batch)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    /// Build the terminal-transition statement for a batch.
    ///
    /// Guarded CAS on `status = 'PENDING'`: if another call already drove
    /// the batch to a terminal state, zero rows match and the surrounding
    /// transaction — including any row promotions — rolls back. This is
    /// what makes a second approve of the same batch a clean Conflict
    /// instead of a re-apply.
    pub fn finalize_stmt(&self, batch: &Batch) -> Result<Statement, ServiceError> {
        debug_assert!(batch.status.is_terminal());
        let data =
            serde_json::to_string(batch).map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(Statement::new(
            "UPDATE batches SET data = ?1, status = ?2, updated_at = ?3 \
             WHERE id = ?4 AND status = 'PENDING'",
            vec![
                Value::Text(data),
                Value::Text(batch.status.as_str().to_string()),
                Value::Text(batch.updated_at.clone()),
                Value::Text(batch.id.clone()),
            ],
        )
        .guarded())
    }

    /// Build the DELETE statement for a batch. Guarded so a concurrent
    /// delete surfaces instead of silently passing.
    pub fn delete_stmt(&self, id: &str) -> Statement {
        Statement::new(
            "DELETE FROM batches WHERE id = ?1",
            vec![Value::Text(id.to_string())],
        )
        .guarded()
    }
}

/// Deserialize a Batch from a row's `data` JSON column.
fn row_to_batch(row: &Row) -> Result<Batch, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad batch json: {e}")))
}
