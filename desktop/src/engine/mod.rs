//! Stream engine: owns the streaming session, the application name mapping
//! and the credentials of the current connection.
//!
//! At most one session is ever active. `start` fully disposes of the
//! previous session before the next handshake, and a session ends either
//! through `stop`/`start` (no error reported) or through the pipeline
//! detecting a closed or broken stream.

mod pipeline;
pub mod resolver;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gotify_client::stream::{StreamSession, StreamTransport, redacted, stream_url};
use gotify_client::{Credentials, GotifyError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::consumer::ConsumerHandle;
use crate::events::ErrorKind;
use pipeline::{IngestPipeline, SessionOutcome};
pub use resolver::{ApplicationNames, ApplicationSource, MetadataResolver};

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Live,
    Closing,
    /// Terminal.
    Stopped,
}

impl ConnectionState {
    pub fn is_live(self) -> bool {
        self == Self::Live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Handshake with {url} failed: {source}")]
    HandshakeFailed { url: String, source: GotifyError },

    #[error("Start cancelled")]
    Cancelled,

    #[error("Engine is stopped")]
    Stopped,
}

impl EngineError {
    /// Whether trying again later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HandshakeFailed { source, .. } => !matches!(
                source,
                GotifyError::HandshakeRejected {
                    status: 401 | 403
                }
            ),
            Self::ConfigInvalid(_) | Self::Cancelled | Self::Stopped => false,
        }
    }
}

struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
}

struct EngineInner<T, A> {
    transport: T,
    resolver: MetadataResolver<A>,
    consumer: ConsumerHandle,
    state: watch::Sender<ConnectionState>,
    credentials: Mutex<Option<Credentials>>,
    current: Mutex<Option<ActiveSession>>,
    /// Serializes `start` and `stop`; holds the running pipeline task.
    lifecycle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    next_session: AtomicU64,
}

/// Connection supervisor. Cheap to clone; clones share one engine.
pub struct StreamEngine<T, A> {
    inner: Arc<EngineInner<T, A>>,
}

impl<T, A> Clone for StreamEngine<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: StreamTransport, A: ApplicationSource> StreamEngine<T, A> {
    pub fn new(transport: T, resolver: MetadataResolver<A>, consumer: ConsumerHandle) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            inner: Arc::new(EngineInner {
                transport,
                resolver,
                consumer,
                state,
                credentials: Mutex::new(None),
                current: Mutex::new(None),
                lifecycle: tokio::sync::Mutex::new(None),
                shutdown: CancellationToken::new(),
                next_session: AtomicU64::new(0),
            }),
        }
    }

    /// Connect to the stream of `credentials`, replacing any active session.
    ///
    /// Returns once the session is live. Failures are returned here and are
    /// never retried by the engine.
    pub async fn start(&self, credentials: &Credentials) -> Result<SessionId, EngineError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(EngineError::Stopped);
        }
        let url = stream_url(credentials).map_err(|e| EngineError::ConfigInvalid(e.to_string()))?;

        // An in-flight start holds the lifecycle lock until its handshake
        // returns; cancelling it here makes it give the lock up.
        let pending = lock(&self.inner.current)
            .as_ref()
            .map(|active| active.cancel.clone());
        if let Some(cancel) = pending {
            cancel.cancel();
        }
        let mut task = self.inner.lifecycle.lock().await;
        if self.inner.shutdown.is_cancelled() {
            return Err(EngineError::Stopped);
        }
        self.inner.teardown(&mut task).await;

        let id = SessionId(self.inner.next_session.fetch_add(1, Ordering::Relaxed) + 1);
        let cancel = self.inner.shutdown.child_token();
        *lock(&self.inner.current) = Some(ActiveSession {
            id,
            cancel: cancel.clone(),
        });
        self.inner.transition(ConnectionState::Connecting);
        tracing::info!(session = %id, url = %redacted(&url), "Starting stream session");

        let mut session = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.inner.abandon(id);
                return Err(EngineError::Cancelled);
            }
            result = self.inner.transport.connect(&url) => match result {
                Ok(session) => session,
                Err(source) => {
                    tracing::warn!(session = %id, "Stream handshake failed: {source}");
                    self.inner.abandon(id);
                    return Err(EngineError::HandshakeFailed {
                        url: redacted(&url),
                        source,
                    });
                }
            },
        };

        let names = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            names = self.inner.resolver.refresh(credentials) => Some(names),
        };
        let Some(names) = names else {
            session.close().await;
            self.inner.abandon(id);
            return Err(EngineError::Cancelled);
        };

        *lock(&self.inner.credentials) = Some(credentials.clone());
        self.inner.transition(ConnectionState::Live);
        tracing::info!(session = %id, applications = names.len(), "Stream session live");

        let pipeline = IngestPipeline::new(session, id, names, self.inner.consumer.clone());
        let inner = self.inner.clone();
        *task = Some(tokio::spawn(async move {
            let outcome = pipeline.run(cancel).await;
            inner.end_session(id, outcome);
        }));
        Ok(id)
    }

    /// Cancel everything, release the session and enter `Stopped`.
    /// Safe to call more than once.
    pub async fn stop(&self) {
        self.inner.shutdown.cancel();
        let mut task = self.inner.lifecycle.lock().await;
        if self.state() == ConnectionState::Stopped {
            return;
        }
        self.inner.teardown(&mut task).await;
        self.inner.resolver.clear();
        *lock(&self.inner.credentials) = None;
        self.inner.transition(ConnectionState::Stopped);
        tracing::info!("Stream engine stopped");
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Id of the live session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        if !self.state().is_live() {
            return None;
        }
        lock(&self.inner.current).as_ref().map(|active| active.id)
    }

    /// Credentials of the last session that went live, cleared by `stop`.
    pub fn credentials(&self) -> Option<Credentials> {
        lock(&self.inner.credentials).clone()
    }

    /// Current application name mapping.
    pub fn application_names(&self) -> Arc<ApplicationNames> {
        self.inner.resolver.snapshot()
    }

    pub fn consumer(&self) -> &ConsumerHandle {
        &self.inner.consumer
    }
}

impl<T, A> EngineInner<T, A> {
    /// Cancel the active session and wait until its task has finished.
    async fn teardown(&self, task: &mut Option<JoinHandle<()>>) {
        let active = lock(&self.current).take();
        if let Some(active) = active {
            tracing::info!(session = %active.id, "Closing stream session");
            if self.state.borrow().is_live() {
                self.transition(ConnectionState::Closing);
            }
            active.cancel.cancel();
        }
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                tracing::error!("Ingest task failed: {e}");
            }
        }
        self.transition(ConnectionState::Idle);
    }

    /// Drop a session that never went live.
    fn abandon(&self, id: SessionId) {
        let mut current = lock(&self.current);
        if current.as_ref().is_some_and(|active| active.id == id) {
            *current = None;
        }
        drop(current);
        self.transition(ConnectionState::Idle);
    }

    /// Called by the pipeline task when its session ends on its own.
    fn end_session(&self, id: SessionId, outcome: SessionOutcome) {
        {
            let mut current = lock(&self.current);
            if !current.as_ref().is_some_and(|active| active.id == id) {
                // Already torn down by start or stop.
                return;
            }
            *current = None;
        }

        match outcome {
            SessionOutcome::Lost(cause) => {
                tracing::warn!(session = %id, "Connection lost: {cause}");
                self.consumer.report_error(ErrorKind::ConnectionLost, cause);
            }
            SessionOutcome::Closed => {
                tracing::info!(session = %id, "Stream closed by server");
            }
            SessionOutcome::Cancelled => {
                tracing::debug!(session = %id, "Stream session cancelled");
            }
        }
        self.transition(ConnectionState::Idle);
    }

    /// Move to `next` unless already there or stopped. Liveness changes are
    /// posted to the consumer while the state is held, so they arrive in
    /// transition order.
    fn transition(&self, next: ConnectionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == ConnectionState::Stopped || *current == next {
                return false;
            }
            let was_live = current.is_live();
            *current = next;
            if was_live != next.is_live() {
                self.consumer.connection_state(next.is_live());
            }
            true
        });
        if changed {
            tracing::debug!(state = ?next, "Engine state changed");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
