//! Engine events exposed to consumers.
//!
//! Observers are invoked on the consumer context, in the order the engine
//! produced the events.

use message_feed::FeedItem;
use serde::Serialize;

/// Category of a non-fatal error reported while a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A frame could not be decoded; the session continues.
    Decode,
    /// The transport failed mid-session; the session ended.
    ConnectionLost,
}

/// Callbacks fired by the consumer context.
pub trait EngineObserver: Send {
    /// Once per ingested message, after enrichment, in arrival order.
    fn on_message(&mut self, _item: &FeedItem) {}

    /// On every live/not-live transition.
    fn on_connection_state_changed(&mut self, _is_live: bool) {}

    fn on_error(&mut self, _kind: ErrorKind, _detail: &str) {}
}

// -- Payload types --

#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    pub id: i64,
    pub application: String,
    pub title: String,
    pub body: String,
    pub priority: i64,
    pub tier: &'static str,
    pub color: &'static str,
    pub sent_at: String,
    pub relative_age: String,
}

impl From<&FeedItem> for MessagePayload {
    fn from(item: &FeedItem) -> Self {
        let message = item.message();
        let tier = item.tier();
        Self {
            id: message.id,
            application: item.application_label(),
            title: message.display_title().to_string(),
            body: message.display_body().to_string(),
            priority: message.priority,
            tier: tier.label(),
            color: tier.color(),
            sent_at: item.formatted_date(),
            relative_age: item.relative_age().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatusPayload {
    pub is_live: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

/// Observer for headless runs: logs everything and prints each message as
/// one JSON line on stdout.
#[derive(Debug, Default)]
pub struct JsonLinesObserver;

impl EngineObserver for JsonLinesObserver {
    fn on_message(&mut self, item: &FeedItem) {
        match serde_json::to_string(&MessagePayload::from(item)) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("Failed to serialize message {}: {e}", item.id()),
        }
    }

    fn on_connection_state_changed(&mut self, is_live: bool) {
        let payload = ConnectionStatusPayload { is_live };
        tracing::info!(is_live = payload.is_live, "Connection status changed");
    }

    fn on_error(&mut self, kind: ErrorKind, detail: &str) {
        let payload = ErrorPayload {
            kind,
            message: detail.to_string(),
        };
        tracing::error!(kind = ?payload.kind, "{}", payload.message);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use message_feed::Message;

    use super::*;

    #[test]
    fn test_message_payload_fields() {
        let message = Message {
            id: 42,
            app_id: 9,
            title: None,
            body: Some("up again".into()),
            priority: 8,
            sent_at: Utc::now(),
        };
        let item = FeedItem::new(message, None, Utc::now());
        let payload = MessagePayload::from(&item);

        assert_eq!(payload.application, "App #9");
        assert_eq!(payload.title, "Untitled");
        assert_eq!(payload.tier, "urgent");
        assert_eq!(payload.relative_age, "just now");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["color"], "#EF4444");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ConnectionLost).unwrap();
        assert_eq!(json, "\"connection_lost\"");
    }
}
