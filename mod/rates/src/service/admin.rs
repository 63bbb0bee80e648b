//! Direct rate administration, independent of the batch flow: list the
//! live table, correct a price or transit text, toggle visibility, or
//! remove a row outright.

use tracing::info;

use shiperp_core::ServiceError;

use crate::model::RateRow;
use crate::store::ActiveRateFilter;
use super::RatesService;

/// Fields a merge-patch may not touch: identity, the promotion key, the
/// lifecycle status, and audit stamps. Corrections change prices and
/// presentation, never what the row *is*.
const IMMUTABLE_RATE_FIELDS: &[&str] = &[
    "id",
    "countryCode",
    "carrier",
    "service",
    "weightTierKg",
    "status",
    "batchId",
    "approvedAt",
    "approvedBy",
    "createdAt",
];

impl RatesService {
    pub fn get_rate(&self, id: &str) -> Result<RateRow, ServiceError> {
        self.rates.get(id)
    }

    /// The live rate table, optionally filtered.
    pub fn list_active_rates(
        &self,
        filter: &ActiveRateFilter,
    ) -> Result<Vec<RateRow>, ServiceError> {
        self.rates.list_active(filter)
    }

    /// Merge-patch an existing row (price, transit text, visibility).
    pub fn update_rate(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<RateRow, ServiceError> {
        let current = self.rates.get(id)?;
        let updated: RateRow = Self::apply_patch(&current, patch, IMMUTABLE_RATE_FIELDS)?;

        if updated.price_minor_units <= 0 {
            return Err(ServiceError::Validation(
                "priceMinorUnits must be positive".into(),
            ));
        }

        self.rates.update(&updated)?;
        info!("rate {} updated", id);
        Ok(updated)
    }

    pub fn delete_rate(&self, id: &str) -> Result<(), ServiceError> {
        self.rates.delete(id)?;
        info!("rate {} deleted", id);
        Ok(())
    }
}
