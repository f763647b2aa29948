//! Background task loops: relative age refresh.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::app::SharedState;

/// Returns true when `token` fired before `duration` elapsed.
pub(crate) async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Ask the consumer to recompute relative ages on every tick.
pub async fn age_refresh_loop(state: SharedState) {
    let shutdown_token = state.shutdown_token().clone();
    let interval = state.config().await.age_refresh_interval;
    tracing::debug!(interval_secs = interval.as_secs(), "Age refresh loop started");

    loop {
        if sleep_or_cancel(&shutdown_token, interval).await {
            tracing::info!("Age refresh loop stopped (shutdown)");
            return;
        }
        state.consumer().refresh_ages();
    }
}
