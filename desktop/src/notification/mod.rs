//! Notification side effects for newly ingested messages.
//!
//! Sound and toast delivery are platform concerns; the engine only decides
//! when to fire them and hands the work to a [`Notifier`].

mod log_notifier;

pub use log_notifier::LogNotifier;

use message_feed::FeedItem;
use serde::{Deserialize, Serialize};

/// Runtime toggles for notification side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub sound_enabled: bool,
    pub toast_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            toast_enabled: true,
        }
    }
}

/// Platform sink for user-facing notifications.
///
/// Called on the consumer context only.
pub trait Notifier: Send {
    fn show_toast(&mut self, title: &str, body: &str);
    fn play_sound(&mut self);
}

/// Notifier that does nothing.
#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn show_toast(&mut self, _title: &str, _body: &str) {}
    fn play_sound(&mut self) {}
}

/// Fire the enabled side effects for one new feed item.
pub fn notify_new_item(
    notifier: &mut dyn Notifier,
    settings: NotificationSettings,
    item: &FeedItem,
) {
    let message = item.message();
    if settings.toast_enabled {
        notifier.show_toast(message.display_title(), message.display_body());
    }
    if settings.sound_enabled {
        notifier.play_sound();
    }
}
