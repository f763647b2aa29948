use std::sync::Arc;

use gotify_client::GotifyError;
use gotify_client::api::{CurrentUser, GotifyApiClient};
use gotify_client::stream::TungsteniteTransport;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::consumer::ConsumerHandle;
use crate::engine::{MetadataResolver, SessionId, StreamEngine};
use crate::notification::NotificationSettings;

/// The engine as wired for a real Gotify server.
pub type GotifyEngine = StreamEngine<TungsteniteTransport, GotifyApiClient>;

/// Application shared state, cloned into every background task.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Application configuration (toggles are updated at runtime)
    config: RwLock<AppConfig>,
    engine: GotifyEngine,
    api: GotifyApiClient,
    consumer: ConsumerHandle,
    /// Cancels every background loop on shutdown
    shutdown_token: CancellationToken,
}

impl SharedState {
    /// Build the engine from `config`. `consumer` must already be running.
    pub fn new(config: AppConfig, consumer: ConsumerHandle) -> Result<Self, GotifyError> {
        let api = GotifyApiClient::new(config.request_timeout)?;
        let transport = TungsteniteTransport::new(config.connect_timeout, config.idle_timeout);
        let resolver = MetadataResolver::new(api.clone(), config.request_timeout);
        let engine = StreamEngine::new(transport, resolver, consumer.clone());

        Ok(Self {
            inner: Arc::new(SharedStateInner {
                config: RwLock::new(config),
                engine,
                api,
                consumer,
                shutdown_token: CancellationToken::new(),
            }),
        })
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    pub fn engine(&self) -> &GotifyEngine {
        &self.inner.engine
    }

    pub fn consumer(&self) -> &ConsumerHandle {
        &self.inner.consumer
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }

    /// Verify the configured server and token with `GET /current/user`.
    pub async fn test_connection(&self) -> anyhow::Result<CurrentUser> {
        let credentials = self.config().await.credentials()?;
        Ok(self.inner.api.current_user(&credentials).await?)
    }

    /// Check the connection, then start streaming.
    pub async fn connect(&self) -> anyhow::Result<SessionId> {
        let credentials = self.config().await.credentials()?;
        self.test_connection().await?;
        let session = self.inner.engine.start(&credentials).await?;
        Ok(session)
    }

    /// Update the sound and toast toggles for subsequent messages.
    pub async fn set_notifications(&self, settings: NotificationSettings) {
        {
            let mut config = self.inner.config.write().await;
            config.sound_notifications = settings.sound_enabled;
            config.toast_notifications = settings.toast_enabled;
        }
        self.inner.consumer.set_notifications(settings);
    }

    pub fn clear_feed(&self) {
        self.inner.consumer.clear();
    }
}
