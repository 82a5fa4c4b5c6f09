use nexa_core::observability::init_tracing;
use nexa_frontend::config::get_configuration;
use nexa_frontend::payhere::PayHereGateway;
use nexa_frontend::services::auth_client::AuthClient;
use nexa_frontend::startup::build_router;
use nexa_frontend::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "nexa-frontend",
        &configuration.observability.log_level,
        configuration.observability.otlp_endpoint.as_deref(),
    )?;

    nexa_frontend::services::metrics::init_metrics();

    let auth_client = Arc::new(AuthClient::new(configuration.auth_service.clone()));
    let payhere = Arc::new(PayHereGateway::new(configuration.payhere.clone()));
    let state = AppState::new(auth_client, payhere);

    let app = build_router(state, configuration.server.secure_cookies)?;

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting nexa-frontend on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
