//! The approval state machine.
//!
//! ```text
//! PENDING → APPROVED   (staged rows promoted to ACTIVE)
//!         → REJECTED   (no rate change)
//! ```
//!
//! Both transitions are terminal. Promotion runs as one transaction:
//! supersede, promote, and the batch's own CAS transition commit together
//! or not at all, so a concurrent quote never observes a promotion key
//! with zero or two ACTIVE rows.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use shiperp_core::{now_rfc3339, ServiceError};
use shiperp_sql::SQLError;

use crate::model::{BatchStatus, RateStatus};
use super::RatesService;

/// Result of an approval: how many staged rows went live, and how many
/// were skipped because their key already had an active rate (only
/// possible with `replace_existing = false`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub approved_count: i64,
    pub skipped_count: i64,
}

impl RatesService {
    /// Promote a PENDING batch's staged rows to live rates.
    ///
    /// With `replace_existing`, currently-active rows sharing a promotion
    /// key with an incoming row are disabled in the same transaction that
    /// activates the incoming rows. Without it, colliding keys are
    /// skipped and counted; existing active rows are never touched.
    ///
    /// Any failure mid-promotion rolls the whole transaction back and
    /// leaves the batch PENDING for a deliberate retry.
    pub fn approve_batch(
        &self,
        batch_id: &str,
        replace_existing: bool,
        processed_by: Option<String>,
    ) -> Result<ApprovalOutcome, ServiceError> {
        let batch = self.batches.get(batch_id)?;
        if batch.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "batch {batch_id} already {}",
                batch.status
            )));
        }

        let staged: Vec<_> = self
            .rates
            .rows_for_batch(batch_id)?
            .into_iter()
            .filter(|r| r.status == RateStatus::Pending)
            .collect();

        let now = now_rfc3339();
        let mut stmts = Vec::new();
        let mut promoted: i64 = 0;
        let mut skipped: i64 = 0;

        if replace_existing {
            // Supersede first, then activate: the partial unique index on
            // the ACTIVE key holds at every statement boundary.
            let mut keys = HashSet::new();
            for row in &staged {
                if keys.insert(row.promotion_key()) {
                    stmts.push(self.rates.disable_active_stmt(&row.promotion_key(), &now));
                }
            }
            for row in &staged {
                stmts.push(self.rates.promote_stmt(&row.id, &processed_by, &now));
                promoted += 1;
            }
        } else {
            for row in &staged {
                if self.rates.has_active_for_key(&row.promotion_key())? {
                    skipped += 1;
                } else {
                    stmts.push(self.rates.promote_stmt(&row.id, &processed_by, &now));
                    promoted += 1;
                }
            }
        }

        let mut approved = batch;
        approved.status = BatchStatus::Approved;
        approved.approved_prices = Some(promoted);
        approved.processed_at = Some(now.clone());
        approved.processed_by = processed_by;
        approved.updated_at = now;
        stmts.push(self.batches.finalize_stmt(&approved)?);

        self.db.exec_tx(&stmts).map_err(|e| match e {
            SQLError::GuardFailed(_) => ServiceError::Conflict(format!(
                "batch {batch_id} was processed concurrently"
            )),
            e if e.is_unique_violation() => ServiceError::Conflict(format!(
                "a concurrent promotion activated an overlapping rate key; batch {batch_id} left pending"
            )),
            e => ServiceError::Storage(e.to_string()),
        })?;

        info!(
            "batch {} approved: {} promoted, {} skipped (replace_existing={})",
            batch_id, promoted, skipped, replace_existing
        );

        Ok(ApprovalOutcome {
            approved_count: promoted,
            skipped_count: skipped,
        })
    }

    /// Reject a PENDING batch. No rate changes; staged rows stay PENDING
    /// as audit history, unreachable by quoting.
    pub fn reject_batch(
        &self,
        batch_id: &str,
        reason: String,
        processed_by: Option<String>,
    ) -> Result<(), ServiceError> {
        let batch = self.batches.get(batch_id)?;
        if batch.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "batch {batch_id} already {}",
                batch.status
            )));
        }

        let now = now_rfc3339();
        let mut rejected = batch;
        rejected.status = BatchStatus::Rejected;
        rejected.notes = Some(reason.clone());
        rejected.processed_at = Some(now.clone());
        rejected.processed_by = processed_by;
        rejected.updated_at = now;

        self.db
            .exec_tx(&[self.batches.finalize_stmt(&rejected)?])
            .map_err(|e| match e {
                SQLError::GuardFailed(_) => ServiceError::Conflict(format!(
                    "batch {batch_id} was processed concurrently"
                )),
                e => ServiceError::Storage(e.to_string()),
            })?;

        info!("batch {} rejected: {}", batch_id, reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shiperp_sql::{SQLStore, SqliteStore};

    use crate::duty::Unavailable;
    use crate::model::RateStatus;
    use crate::service::ingest::{IngestInput, IngestRow};
    use crate::service::{RatesConfig, RatesService};
    use crate::store::ActiveRateFilter;
    use super::*;

    fn service() -> RatesService {
        let db: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        RatesService::new(db, Arc::new(Unavailable), RatesConfig::default()).unwrap()
    }

    fn row(country: &str, tier: f64, price: i64) -> IngestRow {
        IngestRow {
            country_code: country.into(),
            country_name: None,
            carrier: "DHL".into(),
            service: "Express".into(),
            weight_tier_kg: tier,
            price_minor_units: price,
            transit_days_text: None,
            is_visible: true,
        }
    }

    fn ingest(svc: &RatesService, rows: Vec<IngestRow>) -> String {
        svc.ingest_batch(IngestInput {
            rows,
            source: "test-scraper".into(),
            country_code: Some("DE".into()),
            notes: None,
            scraped_at: None,
        })
        .unwrap()
        .batch_id
    }

    #[test]
    fn approve_promotes_all_rows() {
        let svc = service();
        let batch_id = ingest(&svc, vec![row("DE", 1.0, 900), row("DE", 2.0, 1200)]);

        let outcome = svc.approve_batch(&batch_id, true, Some("admin".into())).unwrap();
        assert_eq!(outcome.approved_count, 2);
        assert_eq!(outcome.skipped_count, 0);

        let batch = svc.get_batch(&batch_id).unwrap();
        assert_eq!(batch.status, BatchStatus::Approved);
        assert_eq!(batch.approved_prices, Some(2));
        assert_eq!(batch.processed_by.as_deref(), Some("admin"));
        assert!(batch.processed_at.is_some());

        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|r| r.approved_at.is_some()));
    }

    #[test]
    fn approve_terminal_batch_is_conflict() {
        let svc = service();
        let batch_id = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.approve_batch(&batch_id, true, None).unwrap();

        let err = svc.approve_batch(&batch_id, true, None).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // State unchanged: still exactly one active row.
        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn reject_then_approve_is_conflict() {
        let svc = service();
        let batch_id = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.reject_batch(&batch_id, "prices look scraped wrong".into(), None)
            .unwrap();

        let err = svc.approve_batch(&batch_id, true, None).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let batch = svc.get_batch(&batch_id).unwrap();
        assert_eq!(batch.status, BatchStatus::Rejected);
    }

    #[test]
    fn reject_keeps_rows_pending_and_rates_untouched() {
        let svc = service();
        let batch_id = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.reject_batch(&batch_id, "bad scrape".into(), Some("admin".into()))
            .unwrap();

        let rows = svc.batch_rows(&batch_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RateStatus::Pending);

        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert!(active.is_empty());

        let batch = svc.get_batch(&batch_id).unwrap();
        assert_eq!(batch.notes.as_deref(), Some("bad scrape"));
    }

    #[test]
    fn replace_disables_superseded_rows() {
        let svc = service();
        let first = ingest(&svc, vec![row("DE", 1.0, 900), row("DE", 2.0, 1200)]);
        svc.approve_batch(&first, true, None).unwrap();

        // New scrape for the same keys at new prices.
        let second = ingest(&svc, vec![row("DE", 1.0, 950), row("DE", 2.0, 1250)]);
        let outcome = svc.approve_batch(&second, true, None).unwrap();
        assert_eq!(outcome.approved_count, 2);

        // Exactly one ACTIVE row per key, and it's the new price.
        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert_eq!(active.len(), 2);
        let one_kg: Vec<_> = active.iter().filter(|r| r.weight_tier_kg == 1.0).collect();
        assert_eq!(one_kg.len(), 1);
        assert_eq!(one_kg[0].price_minor_units, 950);

        // The superseded rows are DISABLED, not deleted.
        let old_rows = svc.batch_rows(&first).unwrap();
        assert!(old_rows.iter().all(|r| r.status == RateStatus::Disabled));
    }

    #[test]
    fn no_replace_skips_colliding_keys() {
        let svc = service();
        let first = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.approve_batch(&first, true, None).unwrap();

        // Second batch collides on the 1 kg key, adds a new 2 kg key.
        let second = ingest(&svc, vec![row("DE", 1.0, 950), row("DE", 2.0, 1250)]);
        let outcome = svc.approve_batch(&second, false, None).unwrap();
        assert_eq!(outcome.approved_count, 1);
        assert_eq!(outcome.skipped_count, 1);

        // The existing active row was not disabled; the old price stands.
        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert_eq!(active.len(), 2);
        let one_kg: Vec<_> = active.iter().filter(|r| r.weight_tier_kg == 1.0).collect();
        assert_eq!(one_kg[0].price_minor_units, 900);

        // Partial success is recorded on the batch.
        let batch = svc.get_batch(&second).unwrap();
        assert_eq!(batch.status, BatchStatus::Approved);
        assert_eq!(batch.approved_prices, Some(1));
        assert_eq!(batch.total_prices, 2);
    }

    #[test]
    fn skipped_rows_stay_pending() {
        let svc = service();
        let first = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.approve_batch(&first, true, None).unwrap();

        let second = ingest(&svc, vec![row("DE", 1.0, 950)]);
        let outcome = svc.approve_batch(&second, false, None).unwrap();
        assert_eq!(outcome.approved_count, 0);
        assert_eq!(outcome.skipped_count, 1);

        let rows = svc.batch_rows(&second).unwrap();
        assert_eq!(rows[0].status, RateStatus::Pending);
    }

    #[test]
    fn approve_unknown_batch_is_not_found() {
        let svc = service();
        let err = svc.approve_batch("missing", true, None).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn delete_approved_batch_keeps_live_rates() {
        let svc = service();
        let batch_id = ingest(&svc, vec![row("DE", 1.0, 900)]);
        svc.approve_batch(&batch_id, true, None).unwrap();

        svc.delete_batch(&batch_id).unwrap();
        assert!(svc.get_batch(&batch_id).is_err());

        // Promoted rows outlive their batch.
        let active = svc.rates.list_active(&ActiveRateFilter::default()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].batch_id.as_deref(), Some(batch_id.as_str()));
    }
}
