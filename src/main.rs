use anyhow::{Context, Result};
use response_rewrite_proxy::{app, config, logging};
use tracing::info;

/// Environment variable naming the configuration file
const CONFIG_PATH_ENV: &str = "REWRITE_PROXY_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());

    // Load config first (before logging init) to get logging config
    let mut config = config::AppConfig::load_or_default(&config_path);
    config.apply_env_overrides();

    // Initialize logging system
    let _guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging system")?;

    // Missing addresses are fatal here
    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Response rewrite proxy starting...");
    info!(
        "Logging initialized - level: {}, file: {:?}, json: {}",
        config.logging.level, config.logging.file, config.logging.json
    );
    info!(
        "Rewriting {} -> {} for upstream {}",
        config.rewrite.internal_address, config.rewrite.public_address, config.upstream.target
    );

    let mut app = app::App::new(config);
    app.start().context("Failed to start response rewrite proxy")?;

    info!("Response rewrite proxy started successfully. Press Ctrl+C to shutdown.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received, shutting down gracefully...");
    app.wait_for_shutdown().await;

    Ok(())
}
