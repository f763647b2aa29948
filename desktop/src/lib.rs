pub mod app;
pub mod background;
pub mod config;
pub mod consumer;
pub mod engine;
pub mod events;
pub mod notification;
pub mod reconnect;
pub mod shutdown;

use config::AppConfig;

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load `.env` and the runtime config, warning about missing credentials.
pub fn init_foundation() -> AppConfig {
    load_dotenv();
    let config = AppConfig::load();
    if let Err(e) = config.credentials() {
        tracing::warn!("Gotify server not configured: {e}");
    }
    tracing::debug!(?config, "Configuration loaded");
    config
}
