use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as Msg;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::*;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket transport backed by tokio-tungstenite.
///
/// tungstenite reassembles continuation frames itself, so every frame this
/// transport yields is final.
#[derive(Debug, Clone)]
pub struct TungsteniteTransport {
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl Default for TungsteniteTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_TIMEOUT)
    }
}

impl TungsteniteTransport {
    pub fn new(connect_timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            idle_timeout,
        }
    }
}

impl StreamTransport for TungsteniteTransport {
    type Session = TungsteniteSession;

    async fn connect(&self, url: &Url) -> Result<TungsteniteSession, GotifyError> {
        use tokio_tungstenite::tungstenite::Error as WsError;

        tracing::info!(url = %redacted(url), "Connecting to Gotify stream");
        let result = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| GotifyError::Timeout)?;

        match result {
            Ok((ws, response)) => {
                tracing::debug!(status = response.status().as_u16(), "Stream handshake accepted");
                Ok(TungsteniteSession {
                    ws,
                    idle_timeout: self.idle_timeout,
                })
            }
            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                tracing::warn!(status, "Stream handshake rejected by server");
                Err(GotifyError::HandshakeRejected { status })
            }
            Err(e) => Err(GotifyError::WebSocket(e)),
        }
    }
}

/// A live tungstenite connection.
pub struct TungsteniteSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    idle_timeout: Duration,
}

impl StreamSession for TungsteniteSession {
    async fn read_frame(&mut self) -> Result<Frame, GotifyError> {
        loop {
            match tokio::time::timeout(self.idle_timeout, self.ws.next()).await {
                Ok(Some(Ok(Msg::Text(text)))) => {
                    return Ok(Frame::text(text.as_bytes()));
                }
                Ok(Some(Ok(Msg::Binary(data)))) => {
                    return Ok(Frame::Binary {
                        payload: data.to_vec(),
                        fin: true,
                    });
                }
                Ok(Some(Ok(Msg::Ping(data)))) => {
                    tracing::trace!("Stream ping received");
                    let _ = self.ws.send(Msg::Pong(data)).await;
                }
                Ok(Some(Ok(Msg::Close(frame)))) => {
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    tracing::info!(reason = %reason, "Stream closed by server");
                    return Ok(Frame::Close);
                }
                Ok(None) => return Ok(Frame::Close),
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => return Err(GotifyError::WebSocket(e)),
                Err(_) => {
                    tracing::warn!(
                        idle_secs = self.idle_timeout.as_secs(),
                        "No frame received within idle timeout"
                    );
                    return Err(GotifyError::Timeout);
                }
            }
        }
    }

    async fn close(&mut self) {
        match tokio::time::timeout(CLOSE_TIMEOUT, self.ws.close(None)).await {
            Ok(Ok(())) => tracing::debug!("Stream closed"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Stream close failed"),
            Err(_) => tracing::debug!("Stream close timed out"),
        }
    }
}
