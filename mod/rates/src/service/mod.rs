pub mod admin;
pub mod approval;
pub mod ingest;
pub mod quote;
pub mod settings;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use shiperp_core::{merge_patch, now_rfc3339, ListParams, ListResult, ServiceError};
use shiperp_sql::SQLStore;

use crate::duty::DutyEstimator;
use crate::model::{Batch, RateRow};
use crate::store::{BatchFilter, BatchStore, RateStore, SettingStore};

/// Module configuration.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    /// Shipments to this country are domestic: no duty estimation.
    pub home_country: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            home_country: "US".to_string(),
        }
    }
}

/// Rates service — owns the stores and provides the business logic:
/// batch ingestion, the approval state machine, rate administration,
/// the service visibility registry, and quote computation.
pub struct RatesService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) rates: RateStore,
    pub(crate) batches: BatchStore,
    pub(crate) settings: SettingStore,
    pub(crate) duty: Arc<dyn DutyEstimator>,
    pub(crate) config: RatesConfig,
}

impl RatesService {
    pub fn new(
        db: Arc<dyn SQLStore>,
        duty: Arc<dyn DutyEstimator>,
        config: RatesConfig,
    ) -> Result<Self, ServiceError> {
        let rates = RateStore::new(Arc::clone(&db))?;
        let batches = BatchStore::new(Arc::clone(&db))?;
        let settings = SettingStore::new(Arc::clone(&db))?;
        Ok(Self {
            db,
            rates,
            batches,
            settings,
            duty,
            config,
        })
    }

    // ── Batch reads ──

    pub fn get_batch(&self, id: &str) -> Result<Batch, ServiceError> {
        self.batches.get(id)
    }

    pub fn list_batches(
        &self,
        params: &ListParams,
        filter: &BatchFilter,
    ) -> Result<ListResult<Batch>, ServiceError> {
        self.batches.list(params, filter)
    }

    /// All rows owned by a batch — staged, promoted, or superseded.
    pub fn batch_rows(&self, batch_id: &str) -> Result<Vec<RateRow>, ServiceError> {
        // Surface NotFound for an unknown batch instead of an empty list.
        self.batches.get(batch_id)?;
        self.rates.rows_for_batch(batch_id)
    }

    /// Delete a batch and its still-pending rows. Promoted rows outlive
    /// the batch (their batch_id becomes a dangling back-reference).
    pub fn delete_batch(&self, batch_id: &str) -> Result<(), ServiceError> {
        self.batches.get(batch_id)?;

        self.db
            .exec_tx(&[
                self.rates.delete_pending_for_batch_stmt(batch_id),
                self.batches.delete_stmt(batch_id),
            ])
            .map_err(|e| match e {
                shiperp_sql::SQLError::GuardFailed(_) => {
                    ServiceError::Conflict(format!("batch {batch_id} was concurrently deleted"))
                }
                e => ServiceError::Storage(e.to_string()),
            })?;

        tracing::info!("batch {} deleted", batch_id);
        Ok(())
    }

    // ── Patch helper ──

    /// Apply a JSON merge-patch to a record, stripping immutable fields
    /// and stamping `updatedAt`.
    pub(crate) fn apply_patch<T: Serialize + DeserializeOwned>(
        current: &T,
        patch: serde_json::Value,
        immutable: &[&str],
    ) -> Result<T, ServiceError> {
        let mut json = serde_json::to_value(current)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut patch_filtered = patch;
        if let Some(obj) = patch_filtered.as_object_mut() {
            for field in immutable {
                obj.remove(*field);
            }
            obj.insert("updatedAt".into(), serde_json::json!(now_rfc3339()));
        }

        merge_patch(&mut json, &patch_filtered);
        serde_json::from_value(json)
            .map_err(|e| ServiceError::Validation(format!("invalid patch: {e}")))
    }
}
