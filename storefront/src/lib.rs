pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use config::SiteSettings;
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::TenancyConfig;
use services::backend_client::BackendClient;
use std::sync::Arc;

/// Shared application state: backend client plus immutable startup configuration.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub tenancy: Arc<TenancyConfig>,
    pub site: Arc<SiteSettings>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        backend: Arc<BackendClient>,
        tenancy: Arc<TenancyConfig>,
        site: Arc<SiteSettings>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            backend,
            tenancy,
            site,
            metrics,
        }
    }
}
