use serde::{Deserialize, Serialize};

/// Input to the quote calculator. All customer context (multiplier,
/// customs value) is explicit here — nothing is read from ambient
/// session state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// ISO destination country code.
    pub destination_country: String,

    /// Package dimensions in centimeters.
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,

    /// Actual (scale) weight in kilograms.
    pub weight_kg: f64,

    /// Per-customer price multiplier. Absent or 1.0 means list price.
    #[serde(default)]
    pub multiplier: Option<f64>,

    /// Declared customs value in minor units; triggers duty estimation
    /// for non-domestic destinations.
    #[serde(default)]
    pub customs_value_minor_units: Option<i64>,
}

/// One eligible (carrier, service) offer. Base price, multiplier, and
/// total are reported separately — never blended into a single number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOffer {
    pub carrier: String,
    pub service: String,
    pub display_name: String,

    /// The tier that matched the billable weight.
    pub weight_tier_kg: f64,

    /// List price in minor units, before any multiplier.
    pub base_price_minor_units: i64,

    /// The multiplier that was applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,

    /// Final shipping price in minor units.
    pub total_price_minor_units: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_days_text: Option<String>,
}

/// Duty/tax estimate section. When the external estimator fails, the
/// quote still carries its shipping prices and this section reports
/// `available: false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyQuote {
    pub available: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duty_minor_units: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_minor_units: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_minor_units: Option<i64>,
}

impl DutyQuote {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            duty_minor_units: None,
            tax_minor_units: None,
            total_minor_units: None,
        }
    }
}

/// The full quote response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// max(actual, volumetric), rounded to 2 decimals half-up.
    pub billable_weight_kg: f64,

    /// Eligible offers sorted by the registry's sort order. May be empty —
    /// a destination with no covering tiers is a valid result.
    pub offers: Vec<QuoteOffer>,

    /// Present only when a customs value was supplied for a non-domestic
    /// destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duties: Option<DutyQuote>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_minimal_json() {
        let json = r#"{
            "destinationCountry": "DE",
            "lengthCm": 30,
            "widthCm": 20,
            "heightCm": 15,
            "weightKg": 2
        }"#;
        let req: QuoteRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.destination_country, "DE");
        assert!(req.multiplier.is_none());
        assert!(req.customs_value_minor_units.is_none());
    }

    #[test]
    fn response_omits_absent_duties() {
        let resp = QuoteResponse {
            billable_weight_kg: 2.0,
            offers: vec![],
            duties: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("duties").is_none());
    }
}
