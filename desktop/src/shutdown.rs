use crate::app::SharedState;

/// Cancel background loops, stop the engine and close the consumer queue.
///
/// The consumer thread finishes the commands already queued before it
/// exits; the caller joins it.
pub async fn graceful_shutdown(state: &SharedState) {
    tracing::info!("Shutdown sequence started");

    state.shutdown_token().cancel();
    tracing::info!("Shutdown: background loops cancelled");

    state.engine().stop().await;
    tracing::info!("Shutdown: stream engine stopped");

    state.consumer().shutdown();
    tracing::info!("Shutdown sequence completed");
}
