//! Relative age text ("5 min ago") for feed items.

use chrono::{DateTime, Local, Utc};

/// Describe how long ago `sent_at` was, relative to `now`.
///
/// Anything older than a week shows the local calendar date instead.
/// Timestamps in the future (server clock ahead of ours) read as "just now".
pub fn relative_age(sent_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(sent_at);

    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{} min ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        sent_at.with_timezone(&Local).format("%d/%m").to_string()
    }
}

/// Full local timestamp, `dd/MM/yyyy HH:mm:ss`.
pub fn format_local(sent_at: DateTime<Utc>) -> String {
    sent_at
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}
