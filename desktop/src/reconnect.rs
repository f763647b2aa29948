//! Opt-in reconnection policy.
//!
//! The engine never reconnects by itself. When enabled in config, this loop
//! watches the engine state and restarts it after a session ends, backing
//! off exponentially between consecutive failures.

use std::time::Duration;

use gotify_client::Credentials;
use gotify_client::stream::StreamTransport;
use tokio_util::sync::CancellationToken;

use crate::app::SharedState;
use crate::background::sleep_or_cancel;
use crate::engine::{ApplicationSource, ConnectionState, EngineError, StreamEngine};

const BASE_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: BASE_BACKOFF,
            max: MAX_BACKOFF,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the attempt following `failures` consecutive failures.
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.base
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }
}

pub fn backoff_duration(failures: u32) -> Duration {
    ReconnectPolicy::default().backoff(failures)
}

/// Why a reconnect loop ended.
#[derive(Debug)]
pub enum ReconnectExit {
    Shutdown,
    EngineStopped,
    /// A start failed for a reason retrying cannot fix.
    GaveUp(EngineError),
}

/// Run the reconnect policy for the host engine, if enabled.
pub async fn auto_reconnect_loop(state: SharedState) {
    let credentials = {
        let config = state.config().await;
        if !config.auto_reconnect {
            tracing::debug!("Auto-reconnect disabled");
            return;
        }
        match config.credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!("Auto-reconnect disabled: {e}");
                return;
            }
        }
    };

    let exit = reconnect_engine(
        state.engine().clone(),
        credentials,
        ReconnectPolicy::default(),
        state.shutdown_token().clone(),
    )
    .await;
    tracing::debug!(?exit, "Auto-reconnect loop finished");
}

/// Restart `engine` whenever it falls back to `Idle`, until it is stopped,
/// `shutdown` fires, or a start fails for a reason retrying cannot fix.
pub async fn reconnect_engine<T, A>(
    engine: StreamEngine<T, A>,
    credentials: Credentials,
    policy: ReconnectPolicy,
    shutdown: CancellationToken,
) -> ReconnectExit
where
    T: StreamTransport,
    A: ApplicationSource,
{
    let mut state_rx = engine.subscribe_state();
    let mut failures: u32 = 0;

    loop {
        let state = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Reconnect loop stopped (shutdown)");
                return ReconnectExit::Shutdown;
            }
            changed = state_rx.wait_for(|s| {
                matches!(s, ConnectionState::Idle | ConnectionState::Stopped)
            }) => match changed {
                Ok(state) => *state,
                Err(_) => return ReconnectExit::EngineStopped,
            },
        };
        if state == ConnectionState::Stopped {
            tracing::info!("Reconnect loop stopped (engine stopped)");
            return ReconnectExit::EngineStopped;
        }

        failures = failures.saturating_add(1);
        let backoff = policy.backoff(failures);
        tracing::warn!(
            attempt = failures,
            backoff_ms = backoff.as_millis() as u64,
            "Stream not connected, will reconnect"
        );
        if sleep_or_cancel(&shutdown, backoff).await {
            tracing::info!("Reconnect loop stopped during backoff (shutdown)");
            return ReconnectExit::Shutdown;
        }
        if engine.state() != ConnectionState::Idle {
            continue;
        }

        match engine.start(&credentials).await {
            Ok(session) => {
                if failures > 1 {
                    tracing::info!(failures, "Failures reset after reconnect");
                }
                failures = 0;
                tracing::info!(session = %session, "Reconnected to stream");
            }
            Err(EngineError::Stopped) => {
                tracing::info!("Reconnect loop stopped (engine stopped)");
                return ReconnectExit::EngineStopped;
            }
            // Another caller's start took over; follow that session.
            Err(EngineError::Cancelled) => {
                tracing::debug!("Reconnect attempt superseded");
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, attempt = failures, "Reconnect attempt failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reconnect failed permanently; giving up");
                return ReconnectExit::GaveUp(e);
            }
        }
    }
}
