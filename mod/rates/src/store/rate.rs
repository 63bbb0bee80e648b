use std::sync::Arc;

use shiperp_core::ServiceError;
use shiperp_sql::{Row, SQLStore, Statement, Value};

use crate::model::{PromotionKey, RateRow, RateStatus};

/// SQL schema for the rates table.
///
/// The full JSON document lives in `data`; the promotion-key columns,
/// status, and visibility are extracted for filtering and for the
/// active-key constraint. The tier bound is stored in integer grams so
/// key matching never compares floats.
///
/// The partial UNIQUE index is the invariant of the whole subsystem:
/// at most one ACTIVE row per (country, carrier, service, tier). Any
/// transaction that would create a second one fails and rolls back.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS rates (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        country_code TEXT NOT NULL,
        carrier TEXT NOT NULL,
        service TEXT NOT NULL,
        weight_tier_g INTEGER NOT NULL,
        price_minor_units INTEGER NOT NULL,
        status TEXT NOT NULL,
        is_visible INTEGER NOT NULL,
        batch_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_rates_active_key
        ON rates(country_code, carrier, service, weight_tier_g)
        WHERE status = 'ACTIVE'",
    "CREATE INDEX IF NOT EXISTS idx_rates_status ON rates(status)",
    "CREATE INDEX IF NOT EXISTS idx_rates_batch ON rates(batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_rates_country ON rates(country_code)",
];

/// Filters for listing ACTIVE rates.
#[derive(Debug, Default, Clone)]
pub struct ActiveRateFilter {
    pub country: Option<String>,
    pub carrier: Option<String>,
    pub min_weight_kg: Option<f64>,
    pub max_weight_kg: Option<f64>,
}

/// Persistent storage for rate rows, backed by SQLStore (SQLite).
pub struct RateStore {
    db: Arc<dyn SQLStore>,
}

impl RateStore {
    /// Create a new RateStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(format!("rates schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Build the INSERT statement for a row. Used inside ingestion
    /// transactions, so it returns a Statement instead of executing.
    pub fn insert_stmt(&self, row: &RateRow) -> Result<Statement, ServiceError> {
        let data =
            serde_json::to_string(row).map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(Statement::new(
            "INSERT INTO rates (id, data, country_code, carrier, service, weight_tier_g, \
             price_minor_units, status, is_visible, batch_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            vec![
                Value::Text(row.id.clone()),
                Value::Text(data),
                Value::Text(row.country_code.clone()),
                Value::Text(row.carrier.clone()),
                Value::Text(row.service.clone()),
                Value::Integer(row.weight_tier_grams()),
                Value::Integer(row.price_minor_units),
                Value::Text(row.status.as_str().to_string()),
                Value::Integer(row.is_visible as i64),
                Value::opt_text(&row.batch_id),
                Value::Text(row.created_at.clone()),
                Value::Text(row.updated_at.clone()),
            ],
        ))
    }

    /// Get a rate row by ID.
    pub fn get(&self, id: &str) -> Result<RateRow, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM rates WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("rate {id}")))?;

        row_to_rate(row)
    }

    /// Update a row (full replacement of the data column + indexed columns).
    pub fn update(&self, row: &RateRow) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(row).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE rates SET data = ?1, price_minor_units = ?2, status = ?3, \
                 is_visible = ?4, updated_at = ?5 WHERE id = ?6",
                &[
                    Value::Text(data),
                    Value::Integer(row.price_minor_units),
                    Value::Text(row.status.as_str().to_string()),
                    Value::Integer(row.is_visible as i64),
                    Value::Text(row.updated_at.clone()),
                    Value::Text(row.id.clone()),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("rate {}", row.id)));
        }
        Ok(())
    }

    /// Delete a rate row by ID.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "DELETE FROM rates WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("rate {id}")));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// List ACTIVE rows with optional filters, ordered by country,
    /// carrier, then ascending tier.
    pub fn list_active(&self, filter: &ActiveRateFilter) -> Result<Vec<RateRow>, ServiceError> {
        let mut where_clauses = vec!["status = 'ACTIVE'".to_string()];
        let mut params: Vec<Value> = Vec::new();

        if let Some(ref c) = filter.country {
            where_clauses.push(format!("country_code = ?{}", params.len() + 1));
            params.push(Value::Text(c.clone()));
        }
        if let Some(ref c) = filter.carrier {
            where_clauses.push(format!("carrier = ?{}", params.len() + 1));
            params.push(Value::Text(c.clone()));
        }
        if let Some(min) = filter.min_weight_kg {
            where_clauses.push(format!("weight_tier_g >= ?{}", params.len() + 1));
            params.push(Value::Integer(crate::model::rate::kg_to_grams(min)));
        }
        if let Some(max) = filter.max_weight_kg {
            where_clauses.push(format!("weight_tier_g <= ?{}", params.len() + 1));
            params.push(Value::Integer(crate::model::rate::kg_to_grams(max)));
        }

        let sql = format!(
            "SELECT data FROM rates WHERE {} ORDER BY country_code, carrier, service, weight_tier_g",
            where_clauses.join(" AND "),
        );

        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_rate).collect()
    }

    /// All rows belonging to a batch, staged or promoted.
    pub fn rows_for_batch(&self, batch_id: &str) -> Result<Vec<RateRow>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM rates WHERE batch_id = ?1 ORDER BY country_code, carrier, service, weight_tier_g",
                &[Value::Text(batch_id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_rate).collect()
    }

    /// Whether an ACTIVE row exists for the given promotion key.
    pub fn has_active_for_key(&self, key: &PromotionKey) -> Result<bool, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT COUNT(*) as cnt FROM rates WHERE country_code = ?1 AND carrier = ?2 \
                 AND service = ?3 AND weight_tier_g = ?4 AND status = 'ACTIVE'",
                &[
                    Value::Text(key.country_code.clone()),
                    Value::Text(key.carrier.clone()),
                    Value::Text(key.service.clone()),
                    Value::Integer(key.weight_tier_g),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    /// The ACTIVE, customer-visible row for a destination and service with
    /// the smallest tier covering the billable weight. Tiers are inclusive
    /// upper bounds.
    pub fn find_tier(
        &self,
        country: &str,
        carrier: &str,
        service: &str,
        billable_g: i64,
    ) -> Result<Option<RateRow>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM rates WHERE country_code = ?1 AND carrier = ?2 \
                 AND service = ?3 AND status = 'ACTIVE' AND is_visible = 1 \
                 AND weight_tier_g >= ?4 ORDER BY weight_tier_g ASC LIMIT 1",
                &[
                    Value::Text(country.to_string()),
                    Value::Text(carrier.to_string()),
                    Value::Text(service.to_string()),
                    Value::Integer(billable_g),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.first().map(row_to_rate).transpose()
    }

    // -----------------------------------------------------------------------
    // Promotion statements (composed into one exec_tx by the approval engine)
    // -----------------------------------------------------------------------

    /// Disable any currently-ACTIVE row sharing the promotion key. Zero
    /// affected rows is fine — the key may simply have had no live rate yet.
    pub fn disable_active_stmt(&self, key: &PromotionKey, now: &str) -> Statement {
        Statement::new(
            "UPDATE rates SET status = 'DISABLED', updated_at = ?1, \
             data = json_set(data, '$.status', 'DISABLED', '$.updatedAt', ?1) \
             WHERE country_code = ?2 AND carrier = ?3 AND service = ?4 \
             AND weight_tier_g = ?5 AND status = 'ACTIVE'",
            vec![
                Value::Text(now.to_string()),
                Value::Text(key.country_code.clone()),
                Value::Text(key.carrier.clone()),
                Value::Text(key.service.clone()),
                Value::Integer(key.weight_tier_g),
            ],
        )
    }

    /// Flip one staged row to ACTIVE. Guarded: the row must still be
    /// PENDING, otherwise the whole promotion rolls back.
    pub fn promote_stmt(
        &self,
        row_id: &str,
        approved_by: &Option<String>,
        now: &str,
    ) -> Statement {
        Statement::new(
            "UPDATE rates SET status = 'ACTIVE', updated_at = ?1, \
             data = json_set(data, '$.status', 'ACTIVE', '$.updatedAt', ?1, \
             '$.approvedAt', ?1, '$.approvedBy', ?2) \
             WHERE id = ?3 AND status = 'PENDING'",
            vec![
                Value::Text(now.to_string()),
                Value::opt_text(approved_by),
                Value::Text(row_id.to_string()),
            ],
        )
        .guarded()
    }

    /// Remove a batch's still-PENDING rows (batch deletion cascade).
    /// Promoted rows are left untouched.
    pub fn delete_pending_for_batch_stmt(&self, batch_id: &str) -> Statement {
        Statement::new(
            "DELETE FROM rates WHERE batch_id = ?1 AND status = 'PENDING'",
            vec![Value::Text(batch_id.to_string())],
        )
    }
}

/// Deserialize a RateRow from a row's `data` JSON column.
fn row_to_rate(row: &Row) -> Result<RateRow, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| ServiceError::Storage(format!("bad rate json: {e}")))
}
