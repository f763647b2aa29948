//! Gotify server client library.
//!
//! Provides the credential pair used by every request, a REST API client
//! for one-shot lookups, and the streaming transport that carries push
//! messages over a WebSocket.

pub mod api;
pub mod stream;

use std::fmt;

/// Header carrying the client token on REST requests.
pub const AUTH_HEADER: &str = "X-Gotify-Key";

/// Server base URL and client token.
///
/// The caller is responsible for persisting these; this crate only
/// normalizes and validates them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    server_url: String,
    client_token: String,
}

impl Credentials {
    /// Build credentials, trimming whitespace and any trailing `/` from the URL.
    pub fn new(server_url: &str, client_token: &str) -> Result<Self, GotifyError> {
        let server_url = server_url.trim().trim_end_matches('/').to_string();
        let client_token = client_token.trim().to_string();

        if server_url.is_empty() {
            return Err(GotifyError::InvalidConfig("server URL is empty".into()));
        }
        if client_token.is_empty() {
            return Err(GotifyError::InvalidConfig("client token is empty".into()));
        }

        Ok(Self {
            server_url,
            client_token,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn client_token(&self) -> &str {
        &self.client_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("client_token", &"***")
            .finish()
    }
}

/// Unified error type for the gotify-client crate.
#[derive(Debug, thiserror::Error)]
pub enum GotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Stream handshake rejected (status {status})")]
    HandshakeRejected { status: u16 },

    #[error("Gotify API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
