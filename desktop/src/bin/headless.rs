//! Headless client binary: streams Gotify messages without a window.
//!
//! Each received message is printed as one JSON line on stdout; toasts and
//! sounds are logged.

use tracing_subscriber::EnvFilter;

use gotify_desktop_lib::app::SharedState;
use gotify_desktop_lib::background;
use gotify_desktop_lib::consumer::ConsumerContext;
use gotify_desktop_lib::events::JsonLinesObserver;
use gotify_desktop_lib::notification::LogNotifier;
use gotify_desktop_lib::reconnect;
use gotify_desktop_lib::shutdown::graceful_shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Gotify desktop client (headless mode)");

    let config = gotify_desktop_lib::init_foundation();

    let mut context = ConsumerContext::new(Box::new(LogNotifier), config.notification_settings());
    context.add_observer(Box::new(JsonLinesObserver));
    let (consumer, consumer_thread) = context.spawn()?;
    let state = SharedState::new(config, consumer)?;

    let s = state.clone();
    tokio::spawn(async move { background::age_refresh_loop(s).await });

    match state.connect().await {
        Ok(session) => tracing::info!(session = %session, "Listening for messages. Press Ctrl+C to stop."),
        Err(e) => tracing::error!("Connection failed: {e:#}"),
    }

    let s = state.clone();
    tokio::spawn(async move { reconnect::auto_reconnect_loop(s).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    graceful_shutdown(&state).await;
    tokio::task::spawn_blocking(move || consumer_thread.join()).await?;
    Ok(())
}
