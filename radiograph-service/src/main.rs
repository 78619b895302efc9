use dotenvy::dotenv;
use radiograph_service::config::get_configuration;
use radiograph_service::services::metrics::init_metrics;
use radiograph_service::startup::Application;
use secrecy::ExposeSecret;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "radiograph-service",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    init_metrics().map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    if configuration.analysis.api_key.expose_secret().is_empty() {
        tracing::warn!("APP_ANALYSIS__API_KEY is not set; analyses will report a configuration error");
    }

    let application = Application::build(configuration).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    application.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
