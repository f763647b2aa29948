use super::Notifier;

/// Notifier for headless runs: toasts and sounds become log lines.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_toast(&mut self, title: &str, body: &str) {
        tracing::info!(title, body, "Notification");
    }

    fn play_sound(&mut self) {
        tracing::debug!("Notification sound");
    }
}
