//! A message enriched with its display fields.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::age::{format_local, relative_age};
use crate::message::Message;
use crate::priority::PriorityTier;

/// A published feed entry.
///
/// The wrapped [`Message`] is only reachable by shared reference, so its
/// identity fields cannot change after publication; the relative age is the
/// only field that is ever recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    message: Message,
    application_name: Option<String>,
    relative_age: String,
}

impl FeedItem {
    pub fn new(message: Message, application_name: Option<String>, now: DateTime<Utc>) -> Self {
        let relative_age = relative_age(message.sent_at, now);
        Self {
            message,
            application_name,
            relative_age,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn id(&self) -> i64 {
        self.message.id
    }

    /// Resolved application name, or `App #<id>` when unknown.
    pub fn application_label(&self) -> String {
        match self.application_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("App #{}", self.message.app_id),
        }
    }

    pub fn relative_age(&self) -> &str {
        &self.relative_age
    }

    pub fn tier(&self) -> PriorityTier {
        self.message.tier()
    }

    pub fn formatted_date(&self) -> String {
        format_local(self.message.sent_at)
    }

    /// Recompute the relative age. Returns whether the text changed.
    pub fn refresh_age(&mut self, now: DateTime<Utc>) -> bool {
        let age = relative_age(self.message.sent_at, now);
        if age == self.relative_age {
            return false;
        }
        self.relative_age = age;
        true
    }
}
