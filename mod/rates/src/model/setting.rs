use serde::{Deserialize, Serialize};

/// Visibility/display configuration for one (carrier, service) pair.
///
/// Edited directly by admins; consulted, never mutated, by the quote
/// calculator. Only pairs with `is_active` appear in customer quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSetting {
    /// UUID primary key.
    #[serde(default)]
    pub id: String,

    pub carrier: String,
    pub service: String,

    /// Customer-facing label (e.g. "DHL Express").
    pub display_name: String,

    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Display position in quote results, ascending.
    #[serde(default)]
    pub sort_order: i64,

    pub created_at: String,
    pub updated_at: String,
}

fn default_active() -> bool {
    true
}
