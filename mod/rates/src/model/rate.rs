use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RateStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a rate row.
///
/// ```text
/// PENDING → ACTIVE    (batch approved, row promoted)
/// ACTIVE  → DISABLED  (superseded by a newer promotion, or admin delete-by-disable)
/// ```
///
/// Rows of a rejected batch stay PENDING forever — they are unreachable by
/// quoting but preserved for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateStatus {
    Pending,
    Active,
    Disabled,
}

impl RateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Disabled => "DISABLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACTIVE" => Some(Self::Active),
            "DISABLED" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RateRow
// ---------------------------------------------------------------------------

/// A priced offer for one weight tier.
///
/// The tier is a bracket upper bound: a row with `weight_tier_kg = 2.0`
/// covers any billable weight up to and including 2.0 kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRow {
    /// UUID primary key.
    #[serde(default)]
    pub id: String,

    /// ISO destination country code (e.g. "DE").
    pub country_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,

    /// Carrier name (e.g. "DHL").
    pub carrier: String,

    /// Carrier service level (e.g. "Express").
    pub service: String,

    /// Bracket upper bound in kilograms.
    pub weight_tier_kg: f64,

    /// Price in integer minor units (cents). Never a float.
    pub price_minor_units: i64,

    /// Free-text transit estimate (e.g. "3-5 days").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_days_text: Option<String>,

    pub status: RateStatus,

    /// Per-row visibility kill-switch, honored by the quote calculator.
    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Originating batch. Non-enforced back-reference: the batch may be
    /// deleted after promotion without touching this row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

fn default_visible() -> bool {
    true
}

impl RateRow {
    /// The uniqueness domain for ACTIVE rows.
    pub fn promotion_key(&self) -> PromotionKey {
        PromotionKey {
            country_code: self.country_code.clone(),
            carrier: self.carrier.clone(),
            service: self.service.clone(),
            weight_tier_g: kg_to_grams(self.weight_tier_kg),
        }
    }

    /// Tier bound in integer grams — the canonical form stored in the
    /// indexed column, so key matching never compares floats.
    pub fn weight_tier_grams(&self) -> i64 {
        kg_to_grams(self.weight_tier_kg)
    }
}

/// Convert kilograms to integer grams, rounded to the nearest gram.
pub fn kg_to_grams(kg: f64) -> i64 {
    (kg * 1000.0).round() as i64
}

/// (country, carrier, service, weight tier) — at most one ACTIVE rate row
/// may exist per key at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromotionKey {
    pub country_code: String,
    pub carrier: String,
    pub service: String,
    pub weight_tier_g: i64,
}
