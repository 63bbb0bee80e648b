//! Duty estimation seam.
//!
//! Duty/tax estimation is an external collaborator. The rates module only
//! knows this trait; a concrete integration (third-party API client) is
//! injected at startup time. Estimator failure never fails a quote — the
//! quote calculator degrades to `duties.available = false`.

use thiserror::Error;

/// Input to a duty estimation call.
#[derive(Debug, Clone)]
pub struct DutyRequest {
    pub destination_country: String,
    pub customs_value_minor_units: i64,
    pub billable_weight_kg: f64,
}

/// A successful duty estimate, all amounts in integer minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct DutyEstimate {
    pub duty_minor_units: i64,
    pub tax_minor_units: i64,
}

impl DutyEstimate {
    pub fn total_minor_units(&self) -> i64 {
        self.duty_minor_units + self.tax_minor_units
    }
}

#[derive(Error, Debug)]
pub enum DutyError {
    /// The external service failed or declined to estimate.
    #[error("duty service unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable duty estimator.
pub trait DutyEstimator: Send + Sync {
    fn estimate(&self, req: &DutyRequest) -> Result<DutyEstimate, DutyError>;
}

/// Default estimator for deployments without a duty provider: every call
/// reports unavailable, so quotes carry shipping prices only.
pub struct Unavailable;

impl DutyEstimator for Unavailable {
    fn estimate(&self, _req: &DutyRequest) -> Result<DutyEstimate, DutyError> {
        Err(DutyError::Unavailable("no duty provider configured".into()))
    }
}

/// Flat-rate estimator: duty and tax as basis points of the customs value.
/// Used in development and tests.
pub struct FlatRate {
    pub duty_rate_bps: i64,
    pub tax_rate_bps: i64,
}

impl FlatRate {
    fn portion(value_minor_units: i64, rate_bps: i64) -> i64 {
        // Integer half-up rounding on minor units.
        (value_minor_units * rate_bps + 5_000) / 10_000
    }
}

impl DutyEstimator for FlatRate {
    fn estimate(&self, req: &DutyRequest) -> Result<DutyEstimate, DutyError> {
        Ok(DutyEstimate {
            duty_minor_units: Self::portion(req.customs_value_minor_units, self.duty_rate_bps),
            tax_minor_units: Self::portion(req.customs_value_minor_units, self.tax_rate_bps),
        })
    }
}
