use std::sync::Arc;

use shiperp_core::ServiceError;
use shiperp_sql::{Row, SQLStore, Value};

use crate::model::ServiceSetting;

/// SQL schema for the service_settings table. One row per
/// (carrier, service) pair — duplicates are a Conflict.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS service_settings (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        carrier TEXT NOT NULL,
        service TEXT NOT NULL,
        is_active INTEGER NOT NULL,
        sort_order INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(carrier, service)
    )",
    "CREATE INDEX IF NOT EXISTS idx_settings_active ON service_settings(is_active)",
];

/// Persistent storage for service visibility settings.
pub struct SettingStore {
    db: Arc<dyn SQLStore>,
}

impl SettingStore {
    /// Create a new SettingStore and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(format!("settings schema init: {e}")))?;
        }
        Ok(Self { db })
    }

    /// Insert a new setting. A duplicate (carrier, service) is a Conflict.
    pub fn insert(&self, setting: &ServiceSetting) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(setting).map_err(|e| ServiceError::Internal(e.to_string()))?;

        self.db
            .exec(
                "INSERT INTO service_settings (id, data, carrier, service, is_active, \
                 sort_order, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                &[
                    Value::Text(setting.id.clone()),
                    Value::Text(data),
                    Value::Text(setting.carrier.clone()),
                    Value::Text(setting.service.clone()),
                    Value::Integer(setting.is_active as i64),
                    Value::Integer(setting.sort_order),
                    Value::Text(setting.created_at.clone()),
                    Value::Text(setting.updated_at.clone()),
                ],
            )
            .map_err(|e| {
                if e.is_unique_violation() {
                    ServiceError::Conflict(format!(
                        "service setting for {}/{} already exists",
                        setting.carrier, setting.service
                    ))
                } else {
                    ServiceError::Storage(e.to_string())
                }
            })?;

        Ok(())
    }

    /// Get a setting by ID.
    pub fn get(&self, id: &str) -> Result<ServiceSetting, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM service_settings WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("service setting {id}")))?;

        row_to_setting(row)
    }

    /// List all settings in display order.
    pub fn list_all(&self) -> Result<Vec<ServiceSetting>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM service_settings ORDER BY sort_order, carrier, service",
                &[],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_setting).collect()
    }

    /// List active settings in display order — the quote calculator's view.
    pub fn list_active(&self) -> Result<Vec<ServiceSetting>, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT data FROM service_settings WHERE is_active = 1 \
                 ORDER BY sort_order, carrier, service",
                &[],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_setting).collect()
    }

    /// Update a setting (full replacement of the data column + indexed columns).
    pub fn update(&self, setting: &ServiceSetting) -> Result<(), ServiceError> {
        let data =
            serde_json::to_string(setting).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let affected = self
            .db
            .exec(
                "UPDATE service_settings SET data = ?1, carrier = ?2, service = ?3, \
                 is_active = ?4, sort_order = ?5, updated_at = ?6 WHERE id = ?7",
                &[
                    Value::Text(data),
                    Value::Text(setting.carrier.clone()),
                    Value::Text(setting.service.clone()),
                    Value::Integer(setting.is_active as i64),
                    Value::Integer(setting.sort_order),
                    Value::Text(setting.updated_at.clone()),
                    Value::Text(setting.id.clone()),
                ],
            )
            .map_err(|e| {
                if e.is_unique_violation() {
                    ServiceError::Conflict(format!(
                        "service setting for {}/{} already exists",
                        setting.carrier, setting.service
                    ))
                } else {
                    ServiceError::Storage(e.to_string())
                }
            })?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "service setting {}",
                setting.id
            )));
        }
        Ok(())
    }

    /// Delete a setting by ID.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "DELETE FROM service_settings WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("service setting {id}")));
        }
        Ok(())
    }
}

/// Deserialize a ServiceSetting from a row's `data` JSON column.
fn row_to_setting(row: &Row) -> Result<ServiceSetting, ServiceError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ServiceError::Storage(format!("bad setting json: {e}")))
}
