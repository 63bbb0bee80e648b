use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use shiperp_core::{new_id, now_rfc3339, ServiceError};

use crate::model::{Batch, BatchStatus, RateRow, RateStatus};
use super::RatesService;

/// One proposed rate row in an ingestion submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRow {
    pub country_code: String,
    #[serde(default)]
    pub country_name: Option<String>,
    pub carrier: String,
    pub service: String,
    pub weight_tier_kg: f64,
    pub price_minor_units: i64,
    #[serde(default)]
    pub transit_days_text: Option<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

/// An ingestion submission: proposed rows plus provenance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestInput {
    pub rows: Vec<IngestRow>,
    /// Provenance tag (e.g. "dhl-website-scraper").
    pub source: String,
    /// Batch-level country, if single-country.
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub scraped_at: Option<String>,
}

/// What ingestion returns on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub batch_id: String,
    pub accepted: usize,
}

impl RatesService {
    /// Stage a scraped price table as a new PENDING batch.
    ///
    /// Validation is all-or-nothing: any bad row rejects the whole
    /// submission and nothing is persisted. (Approval, by contrast, may
    /// partially promote — see `approve_batch`.) Live rates are never
    /// touched here.
    pub fn ingest_batch(&self, input: IngestInput) -> Result<IngestReceipt, ServiceError> {
        if input.source.trim().is_empty() {
            return Err(ServiceError::Validation("source must not be empty".into()));
        }
        if input.rows.is_empty() {
            return Err(ServiceError::Validation(
                "submission contains no rows".into(),
            ));
        }

        let mut seen_keys = HashSet::new();
        for (i, row) in input.rows.iter().enumerate() {
            let n = i + 1;
            if row.country_code.trim().is_empty() {
                return Err(ServiceError::Validation(format!(
                    "row {n}: countryCode is required"
                )));
            }
            if row.carrier.trim().is_empty() || row.service.trim().is_empty() {
                return Err(ServiceError::Validation(format!(
                    "row {n}: carrier and service must not be empty"
                )));
            }
            if row.price_minor_units <= 0 {
                return Err(ServiceError::Validation(format!(
                    "row {n}: priceMinorUnits must be positive"
                )));
            }
            if row.weight_tier_kg <= 0.0 {
                return Err(ServiceError::Validation(format!(
                    "row {n}: weightTierKg must be positive"
                )));
            }

            let key = (
                row.country_code.clone(),
                row.carrier.clone(),
                row.service.clone(),
                crate::model::rate::kg_to_grams(row.weight_tier_kg),
            );
            if !seen_keys.insert(key) {
                return Err(ServiceError::Validation(format!(
                    "row {n}: duplicate rate key {}/{}/{} @ {} kg within the submission",
                    row.country_code, row.carrier, row.service, row.weight_tier_kg
                )));
            }
        }

        let now = now_rfc3339();
        let batch = Batch {
            id: new_id(),
            country_code: input.country_code.clone(),
            total_prices: input.rows.len() as i64,
            approved_prices: None,
            status: BatchStatus::Pending,
            source: input.source.clone(),
            notes: input.notes.clone(),
            scraped_at: input.scraped_at.clone(),
            processed_at: None,
            processed_by: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let mut stmts = vec![self.batches.insert_stmt(&batch)?];
        for row in &input.rows {
            let rate = RateRow {
                id: new_id(),
                country_code: row.country_code.clone(),
                country_name: row.country_name.clone(),
                carrier: row.carrier.clone(),
                service: row.service.clone(),
                weight_tier_kg: row.weight_tier_kg,
                price_minor_units: row.price_minor_units,
                transit_days_text: row.transit_days_text.clone(),
                status: RateStatus::Pending,
                is_visible: row.is_visible,
                batch_id: Some(batch.id.clone()),
                approved_at: None,
                approved_by: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            stmts.push(self.rates.insert_stmt(&rate)?);
        }

        self.db
            .exec_tx(&stmts)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let accepted = input.rows.len();
        info!(
            "ingested batch {} from {}: {} rows staged",
            batch.id, batch.source, accepted
        );

        Ok(IngestReceipt {
            batch_id: batch.id,
            accepted,
        })
    }
}
