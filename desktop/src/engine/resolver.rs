//! Application id to name lookup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gotify_client::api::GotifyApiClient;
use gotify_client::api::models::Application;
use gotify_client::{Credentials, GotifyError};

/// Where application metadata comes from.
pub trait ApplicationSource: Send + Sync + 'static {
    fn fetch_applications(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Vec<Application>, GotifyError>> + Send;
}

impl ApplicationSource for GotifyApiClient {
    async fn fetch_applications(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Application>, GotifyError> {
        self.applications(credentials).await
    }
}

/// Immutable id to name mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationNames(HashMap<i64, String>);

impl ApplicationNames {
    pub fn get(&self, app_id: i64) -> Option<&str> {
        self.0.get(&app_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Application> for ApplicationNames {
    fn from_iter<I: IntoIterator<Item = Application>>(iter: I) -> Self {
        Self(iter.into_iter().map(|app| (app.id, app.name)).collect())
    }
}

/// Best-effort cache of application names.
///
/// A failed refresh keeps whatever mapping was there before.
pub struct MetadataResolver<A> {
    source: A,
    timeout: Duration,
    names: Mutex<Arc<ApplicationNames>>,
}

impl<A: ApplicationSource> MetadataResolver<A> {
    pub fn new(source: A, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            names: Mutex::new(Arc::default()),
        }
    }

    /// Fetch the application list. Never fails; returns the mapping in effect
    /// afterwards.
    pub async fn refresh(&self, credentials: &Credentials) -> Arc<ApplicationNames> {
        let fetched =
            tokio::time::timeout(self.timeout, self.source.fetch_applications(credentials)).await;

        match fetched {
            Ok(Ok(applications)) => {
                let names: ApplicationNames = applications.into_iter().collect();
                tracing::info!(count = names.len(), "Application names loaded");
                let names = Arc::new(names);
                self.replace(names.clone());
                names
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to load application names: {e}");
                self.snapshot()
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Loading application names timed out");
                self.snapshot()
            }
        }
    }

    /// Current mapping, without I/O.
    pub fn snapshot(&self) -> Arc<ApplicationNames> {
        match self.names.lock() {
            Ok(names) => names.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        self.replace(Arc::default());
    }

    fn replace(&self, names: Arc<ApplicationNames>) {
        match self.names.lock() {
            Ok(mut current) => *current = names,
            Err(poisoned) => *poisoned.into_inner() = names,
        }
    }
}
