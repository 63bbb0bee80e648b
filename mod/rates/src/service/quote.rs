use tracing::{debug, warn};

use shiperp_core::ServiceError;

use crate::duty::DutyRequest;
use crate::model::{DutyQuote, QuoteOffer, QuoteRequest, QuoteResponse};
use crate::pricing;
use super::RatesService;

impl RatesService {
    /// Compute shipping offers for a package.
    ///
    /// Pure reads: each (carrier, service) tier lookup is independent, and
    /// no lock is held across them. Services come from the visibility
    /// registry (live at quote time, never cached) in display order; a
    /// service with no tier covering the billable weight is omitted, not
    /// an error.
    pub fn compute_quote(&self, req: &QuoteRequest) -> Result<QuoteResponse, ServiceError> {
        if req.destination_country.trim().is_empty() {
            return Err(ServiceError::Validation(
                "destinationCountry is required".into(),
            ));
        }
        if req.length_cm <= 0.0 || req.width_cm <= 0.0 || req.height_cm <= 0.0 {
            return Err(ServiceError::Validation(
                "dimensions must be positive".into(),
            ));
        }
        if req.weight_kg <= 0.0 {
            return Err(ServiceError::Validation("weightKg must be positive".into()));
        }
        if let Some(m) = req.multiplier {
            if m <= 0.0 {
                return Err(ServiceError::Validation(
                    "multiplier must be positive".into(),
                ));
            }
        }

        let billable =
            pricing::billable_weight_kg(req.weight_kg, req.length_cm, req.width_cm, req.height_cm);
        let billable_g = pricing::billable_grams(billable);

        // A multiplier of exactly 1 is list price — report it as absent.
        let multiplier = req.multiplier.filter(|m| *m != 1.0);

        let mut offers = Vec::new();
        for setting in self.settings.list_active()? {
            let Some(rate) = self.rates.find_tier(
                &req.destination_country,
                &setting.carrier,
                &setting.service,
                billable_g,
            )?
            else {
                continue;
            };

            let total = match multiplier {
                Some(m) => pricing::apply_multiplier(rate.price_minor_units, m),
                None => rate.price_minor_units,
            };

            offers.push(QuoteOffer {
                carrier: rate.carrier,
                service: rate.service,
                display_name: setting.display_name,
                weight_tier_kg: rate.weight_tier_kg,
                base_price_minor_units: rate.price_minor_units,
                multiplier,
                total_price_minor_units: total,
                transit_days_text: rate.transit_days_text,
            });
        }

        debug!(
            "quote for {}: billable {} kg, {} offer(s)",
            req.destination_country,
            billable,
            offers.len()
        );

        let duties = match req.customs_value_minor_units {
            Some(customs) if req.destination_country != self.config.home_country => {
                Some(self.estimate_duties(&req.destination_country, customs, billable))
            }
            _ => None,
        };

        Ok(QuoteResponse {
            billable_weight_kg: billable,
            offers,
            duties,
        })
    }

    /// Call the external duty estimator. Failure degrades to an
    /// unavailable marker — it never blocks the shipping price.
    fn estimate_duties(
        &self,
        destination: &str,
        customs_value_minor_units: i64,
        billable_weight_kg: f64,
    ) -> DutyQuote {
        let req = DutyRequest {
            destination_country: destination.to_string(),
            customs_value_minor_units,
            billable_weight_kg,
        };
        match self.duty.estimate(&req) {
            Ok(est) => DutyQuote {
                available: true,
                duty_minor_units: Some(est.duty_minor_units),
                tax_minor_units: Some(est.tax_minor_units),
                total_minor_units: Some(est.total_minor_units()),
            },
            Err(e) => {
                warn!("duty estimate for {} failed: {}", destination, e);
                DutyQuote::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shiperp_core::now_rfc3339;
    use shiperp_sql::{SQLStore, SqliteStore};

    use crate::duty::{DutyEstimator, FlatRate, Unavailable};
    use crate::model::ServiceSetting;
    use crate::service::ingest::{IngestInput, IngestRow};
    use crate::service::{RatesConfig, RatesService};
    use super::*;

    fn service_with(duty: Arc<dyn DutyEstimator>) -> RatesService {
        let db: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        RatesService::new(db, duty, RatesConfig::default()).unwrap()
    }

    fn add_setting(svc: &RatesService, carrier: &str, service: &str, sort: i64, active: bool) {
        let now = now_rfc3339();
        svc.settings
            .insert(&ServiceSetting {
                id: shiperp_core::new_id(),
                carrier: carrier.into(),
                service: service.into(),
                display_name: format!("{carrier} {service}"),
                is_active: active,
                sort_order: sort,
                created_at: now.clone(),
                updated_at: now,
            })
            .unwrap();
    }

    fn seed_rates(svc: &RatesService, carrier: &str, service: &str, tiers: &[(f64, i64)]) {
        let rows = tiers
            .iter()
            .map(|(tier, price)| IngestRow {
                country_code: "DE".into(),
                country_name: None,
                carrier: carrier.into(),
                service: service.into(),
                weight_tier_kg: *tier,
                price_minor_units: *price,
                transit_days_text: Some("3-5 days".into()),
                is_visible: true,
            })
            .collect();
        let batch_id = svc
            .ingest_batch(IngestInput {
                rows,
                source: "test".into(),
                country_code: Some("DE".into()),
                notes: None,
                scraped_at: None,
            })
            .unwrap()
            .batch_id;
        svc.approve_batch(&batch_id, true, None).unwrap();
    }

    fn quote_req(country: &str) -> QuoteRequest {
        QuoteRequest {
            destination_country: country.into(),
            length_cm: 30.0,
            width_cm: 20.0,
            height_cm: 15.0,
            weight_kg: 2.0,
            multiplier: None,
            customs_value_minor_units: None,
        }
    }

    #[test]
    fn billable_weight_from_spec_example() {
        // volumetric = 30×20×15/5000 = 1.8; billable = max(2, 1.8) = 2.00
        let svc = service_with(Arc::new(Unavailable));
        let resp = svc.compute_quote(&quote_req("DE")).unwrap();
        assert_eq!(resp.billable_weight_kg, 2.0);
    }

    #[test]
    fn tier_selection_picks_smallest_covering() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(1.0, 900), (2.0, 1200), (5.0, 2400)]);

        // billable 1.5 kg → the 2 kg tier.
        let mut req = quote_req("DE");
        req.weight_kg = 1.5;
        req.length_cm = 10.0;
        req.width_cm = 10.0;
        req.height_cm = 10.0;
        let resp = svc.compute_quote(&req).unwrap();
        assert_eq!(resp.offers.len(), 1);
        assert_eq!(resp.offers[0].weight_tier_kg, 2.0);
        assert_eq!(resp.offers[0].base_price_minor_units, 1200);
    }

    #[test]
    fn no_matching_tier_omits_offer() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(1.0, 900)]);

        // billable 2 kg exceeds every tier: empty result, not an error.
        let resp = svc.compute_quote(&quote_req("DE")).unwrap();
        assert!(resp.offers.is_empty());
    }

    #[test]
    fn unknown_country_yields_empty_offers() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 2400)]);

        let resp = svc.compute_quote(&quote_req("JP")).unwrap();
        assert!(resp.offers.is_empty());
    }

    #[test]
    fn inactive_service_is_filtered_out() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, false);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 2400)]);

        let resp = svc.compute_quote(&quote_req("DE")).unwrap();
        assert!(resp.offers.is_empty());
    }

    #[test]
    fn offers_sorted_by_registry_order() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "UPS", "Ground", 20, true);
        add_setting(&svc, "DHL", "Express", 10, true);
        seed_rates(&svc, "UPS", "Ground", &[(5.0, 2000)]);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 2400)]);

        let resp = svc.compute_quote(&quote_req("DE")).unwrap();
        assert_eq!(resp.offers.len(), 2);
        assert_eq!(resp.offers[0].carrier, "DHL");
        assert_eq!(resp.offers[1].carrier, "UPS");
    }

    #[test]
    fn multiplier_applies_to_integer_cents() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 1000)]);

        let mut req = quote_req("DE");
        req.multiplier = Some(1.5);
        let resp = svc.compute_quote(&req).unwrap();
        assert_eq!(resp.offers[0].base_price_minor_units, 1000);
        assert_eq!(resp.offers[0].multiplier, Some(1.5));
        assert_eq!(resp.offers[0].total_price_minor_units, 1500);
    }

    #[test]
    fn multiplier_of_one_reports_list_price() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 1000)]);

        let mut req = quote_req("DE");
        req.multiplier = Some(1.0);
        let resp = svc.compute_quote(&req).unwrap();
        assert_eq!(resp.offers[0].multiplier, None);
        assert_eq!(resp.offers[0].total_price_minor_units, 1000);
    }

    #[test]
    fn duty_failure_degrades_to_unavailable() {
        let svc = service_with(Arc::new(Unavailable));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 2400)]);

        let mut req = quote_req("DE");
        req.customs_value_minor_units = Some(10_000);
        let resp = svc.compute_quote(&req).unwrap();

        // Shipping price survives; duties are marked unavailable.
        assert_eq!(resp.offers.len(), 1);
        let duties = resp.duties.unwrap();
        assert!(!duties.available);
        assert!(duties.total_minor_units.is_none());
    }

    #[test]
    fn duty_success_attaches_breakdown() {
        let svc = service_with(Arc::new(FlatRate {
            duty_rate_bps: 500,
            tax_rate_bps: 1900,
        }));
        add_setting(&svc, "DHL", "Express", 1, true);
        seed_rates(&svc, "DHL", "Express", &[(5.0, 2400)]);

        let mut req = quote_req("DE");
        req.customs_value_minor_units = Some(10_000);
        let resp = svc.compute_quote(&req).unwrap();

        let duties = resp.duties.unwrap();
        assert!(duties.available);
        assert_eq!(duties.duty_minor_units, Some(500));
        assert_eq!(duties.tax_minor_units, Some(1900));
        assert_eq!(duties.total_minor_units, Some(2400));
    }

    #[test]
    fn domestic_destination_skips_duty() {
        let svc = service_with(Arc::new(FlatRate {
            duty_rate_bps: 500,
            tax_rate_bps: 1900,
        }));
        add_setting(&svc, "DHL", "Express", 1, true);

        // Home country is US (config default).
        let mut req = quote_req("US");
        req.customs_value_minor_units = Some(10_000);
        let resp = svc.compute_quote(&req).unwrap();
        assert!(resp.duties.is_none());
    }

    #[test]
    fn no_customs_value_means_no_duty_section() {
        let svc = service_with(Arc::new(FlatRate {
            duty_rate_bps: 500,
            tax_rate_bps: 1900,
        }));
        let resp = svc.compute_quote(&quote_req("DE")).unwrap();
        assert!(resp.duties.is_none());
    }

    #[test]
    fn invalid_dimensions_rejected() {
        let svc = service_with(Arc::new(Unavailable));
        let mut req = quote_req("DE");
        req.width_cm = 0.0;
        assert!(matches!(
            svc.compute_quote(&req),
            Err(ServiceError::Validation(_))
        ));
    }
}
