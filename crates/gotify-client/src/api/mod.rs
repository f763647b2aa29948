//! Gotify REST API client.
//!
//! Provides typed access to the endpoints the desktop client needs for
//! one-shot lookups, with the `X-Gotify-Key` header injected on every
//! request and a bounded request timeout.

mod applications;
mod request;
mod users;

pub mod models;

use std::time::Duration;

pub use models::{Application, CurrentUser};

use crate::GotifyError;

/// Default timeout applied to every REST request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gotify REST API client.
///
/// Credentials are passed per call so one client can outlive a change of
/// server or token.
#[derive(Clone)]
pub struct GotifyApiClient {
    pub(super) http: reqwest::Client,
}

impl GotifyApiClient {
    /// Create a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, GotifyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}
