//! Setting keys and their default values.

pub const SERVER_URL: &str = "GOTIFY_SERVER_URL";
pub const CLIENT_TOKEN: &str = "GOTIFY_CLIENT_TOKEN";
pub const SOUND_NOTIFICATIONS: &str = "GOTIFY_SOUND_NOTIFICATIONS";
pub const TOAST_NOTIFICATIONS: &str = "GOTIFY_TOAST_NOTIFICATIONS";
pub const AUTO_RECONNECT: &str = "GOTIFY_AUTO_RECONNECT";
pub const REQUEST_TIMEOUT_SECS: &str = "GOTIFY_REQUEST_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_SECS: &str = "GOTIFY_CONNECT_TIMEOUT_SECS";
pub const IDLE_TIMEOUT_SECS: &str = "GOTIFY_IDLE_TIMEOUT_SECS";
pub const AGE_REFRESH_SECS: &str = "GOTIFY_AGE_REFRESH_SECS";

pub const DEFAULT_SOUND_NOTIFICATIONS: bool = true;
pub const DEFAULT_TOAST_NOTIFICATIONS: bool = true;
pub const DEFAULT_AUTO_RECONNECT: bool = false;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_AGE_REFRESH_SECS: u64 = 60;

/// Every key the loader reads, in display order.
pub const ALL_KEYS: &[&str] = &[
    SERVER_URL,
    CLIENT_TOKEN,
    SOUND_NOTIFICATIONS,
    TOAST_NOTIFICATIONS,
    AUTO_RECONNECT,
    REQUEST_TIMEOUT_SECS,
    CONNECT_TIMEOUT_SECS,
    IDLE_TIMEOUT_SECS,
    AGE_REFRESH_SECS,
];
