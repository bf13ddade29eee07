use dotenvy::dotenv;
use service_core::observability::logging::init_tracing;
use service_core::RequestSigner;
use std::sync::Arc;
use storefront::config::get_configuration;
use storefront::services::backend_client::BackendClient;
use storefront::services::metrics::init_metrics;
use storefront::startup::build_router;
use storefront::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    configuration
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_tracing(
        "storefront",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    let metrics = init_metrics()?;

    let signer = RequestSigner::with_system_clock(configuration.backend.api_secret.clone())?;
    let backend = Arc::new(BackendClient::new(&configuration.backend, signer)?);

    let state = AppState::new(
        backend,
        Arc::new(configuration.tenancy.clone()),
        Arc::new(configuration.site.clone()),
        metrics,
    );
    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(
        main_domain = %configuration.tenancy.main_domain,
        backend = %configuration.backend.url,
        "Starting storefront on {}",
        address
    );
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
