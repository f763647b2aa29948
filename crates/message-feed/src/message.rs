//! Gotify push message as received on the stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::priority::PriorityTier;

const UNTITLED: &str = "Untitled";

/// One push notification.
///
/// Field names follow the wire format: `appid`, `message`, `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(rename = "appid")]
    pub app_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "message", default)]
    pub body: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(rename = "date")]
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("frame is not a valid message: {0}")]
    Json(#[from] serde_json::Error),
}

impl Message {
    /// Decode one text frame.
    pub fn from_json(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Title for display; missing or blank titles become "Untitled".
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => UNTITLED,
        }
    }

    pub fn display_body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn tier(&self) -> PriorityTier {
        PriorityTier::from_priority(self.priority)
    }
}
