//! Bootstrap — first-start checks and collaborator wiring.

use std::sync::Arc;

use shiperp_rates::duty::{DutyEstimator, FlatRate, Unavailable};
use shiperp_rates::service::RatesConfig;
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if let Some(ref country) = config.rates.home_country {
        if country.trim().is_empty() {
            anyhow::bail!("rates.home_country is set but empty.");
        }
    }
    Ok(())
}

/// Build the rates module configuration from the server config.
pub fn rates_config(config: &ServerConfig) -> RatesConfig {
    let mut rates = RatesConfig::default();
    if let Some(ref country) = config.rates.home_country {
        rates.home_country = country.clone();
    }
    rates
}

/// Wire the duty-estimation collaborator. Without a configured provider,
/// quotes degrade to shipping prices only.
pub fn duty_estimator(config: &ServerConfig) -> Arc<dyn DutyEstimator> {
    match config.rates.flat_duty {
        Some(ref flat) => {
            info!(
                "flat-rate duty estimator enabled ({} bps duty, {} bps tax)",
                flat.duty_rate_bps, flat.tax_rate_bps
            );
            Arc::new(FlatRate {
                duty_rate_bps: flat.duty_rate_bps,
                tax_rate_bps: flat.tax_rate_bps,
            })
        }
        None => {
            info!("no duty provider configured; quotes will mark duties unavailable");
            Arc::new(Unavailable)
        }
    }
}
