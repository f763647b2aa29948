//! Gotify push stream over WebSocket.
//!
//! Derives the `/stream` endpoint from the server base URL, defines the
//! transport seam the engine drives (connect, read frame, close), and ships
//! a tokio-tungstenite implementation of it.
//!
//! Transports carry no cancellation argument: callers race the returned
//! futures against their own cancellation token, and dropping a future
//! abandons the pending operation.

mod assembler;
mod connection;

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::{Credentials, GotifyError};

pub use assembler::{AssembledMessage, MessageAssembler, MessageKind};
pub use connection::{TungsteniteSession, TungsteniteTransport};

/// Initial capacity of the per-session receive buffer.
pub const RECEIVE_BUFFER_SIZE: usize = 4096;
/// Largest logical message the assembler accepts.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// The server pings every 45s by default, so two missed pings end the session.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

const STREAM_PATH: &str = "stream";
const TOKEN_PARAM: &str = "token";

/// One unit read off the stream.
///
/// `fin` marks the last fragment of a logical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text { payload: Vec<u8>, fin: bool },
    Binary { payload: Vec<u8>, fin: bool },
    Continuation { payload: Vec<u8>, fin: bool },
    Close,
}

impl Frame {
    /// A complete, unfragmented text message.
    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::Text {
            payload: payload.into(),
            fin: true,
        }
    }
}

/// Opens streaming sessions.
pub trait StreamTransport: Send + Sync + 'static {
    type Session: StreamSession;

    /// Perform the transport handshake. A rejection by the server must
    /// surface as an error, never as a session.
    fn connect(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Self::Session, GotifyError>> + Send;
}

/// One established streaming connection.
pub trait StreamSession: Send + 'static {
    /// Wait for the next frame. End of stream is reported as `Frame::Close`.
    fn read_frame(&mut self) -> impl Future<Output = Result<Frame, GotifyError>> + Send;

    /// Close the connection, ignoring failures.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Derive the stream endpoint: `https` becomes `wss`, `http` becomes `ws`,
/// `/stream` is appended and the token is passed as a query parameter.
pub fn stream_url(credentials: &Credentials) -> Result<Url, GotifyError> {
    let mut url = Url::parse(credentials.server_url())?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(GotifyError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| GotifyError::UnsupportedScheme(url.scheme().to_string()))?;
    url.path_segments_mut()
        .map_err(|_| GotifyError::InvalidConfig("server URL cannot be a base".into()))?
        .pop_if_empty()
        .push(STREAM_PATH);
    url.query_pairs_mut()
        .clear()
        .append_pair(TOKEN_PARAM, credentials.client_token());
    Ok(url)
}

/// Inverse of [`stream_url`]: recover the server base URL.
pub fn server_url_from_stream(url: &Url) -> Result<String, GotifyError> {
    let scheme = match url.scheme() {
        "wss" => "https",
        "ws" => "http",
        other => return Err(GotifyError::UnsupportedScheme(other.to_string())),
    };
    let last_segment = url.path_segments().and_then(|mut segments| segments.next_back());
    if last_segment != Some(STREAM_PATH) {
        return Err(GotifyError::InvalidConfig(format!(
            "not a stream URL: {}",
            redacted(url)
        )));
    }

    let mut base = url.clone();
    base.set_query(None);
    base.set_scheme(scheme)
        .map_err(|_| GotifyError::UnsupportedScheme(scheme.to_string()))?;
    base.path_segments_mut()
        .map_err(|_| GotifyError::InvalidConfig("stream URL cannot be a base".into()))?
        .pop();
    Ok(base.as_str().trim_end_matches('/').to_string())
}

/// The URL without its query, safe to log.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
