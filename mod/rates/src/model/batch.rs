use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an ingestion batch.
///
/// ```text
/// PENDING → APPROVED   (rows promoted, approved_prices set)
///         → REJECTED   (no rate change, staged rows kept for audit)
/// ```
///
/// Both transitions are terminal and irreversible. A mistaken approval
/// requires a new corrective batch, not an un-approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Approved,
    Rejected,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether the batch has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// One ingestion event: a staged set of candidate rate rows, reviewed as
/// a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// UUID primary key.
    #[serde(default)]
    pub id: String,

    /// Destination country, if the batch is single-country. A batch may
    /// span countries, in which case this is null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Number of rows staged at ingestion.
    pub total_prices: i64,

    /// Number of rows actually promoted. Filled on approval; can be less
    /// than `total_prices` when colliding keys were skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_prices: Option<i64>,

    pub status: BatchStatus,

    /// Provenance tag (e.g. "dhl-website-scraper").
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the upstream scrape ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}
