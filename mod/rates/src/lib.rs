pub mod api;
pub mod duty;
pub mod model;
pub mod pricing;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use shiperp_core::Module;

use service::RatesService;

/// Rates Module — rate ingestion, approval, and quote computation.
pub struct RatesModule {
    service: Arc<RatesService>,
}

impl RatesModule {
    pub fn new(service: RatesService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Module for RatesModule {
    fn name(&self) -> &str {
        "rates"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
