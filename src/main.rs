//! Entry point: load config, bootstrap persistence, and hold it until shutdown.

use persistence_bootstrap::config::{PropertySource, DEFAULT_PROPERTIES_PATH};
use persistence_bootstrap::bootstrap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path =
        std::env::var("APP_PROPERTIES").unwrap_or_else(|_| DEFAULT_PROPERTIES_PATH.to_string());
    let source = PropertySource::load(&path)
        .map_err(|e| anyhow::anyhow!("config: {}", e))?
        .with_env_overrides();
    tracing::debug!(properties = ?source, "configuration loaded");

    let persistence = bootstrap(&source, Vec::new()).await?;
    let settings = persistence.pool.settings();
    tracing::info!(
        driver = %persistence.pool.driver(),
        max_total = settings.max_total,
        schema_mode = persistence.unit.schema_mode().as_str(),
        "startup complete, waiting for shutdown signal"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    persistence.shutdown().await?;
    Ok(())
}
