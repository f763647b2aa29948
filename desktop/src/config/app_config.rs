//! Runtime application configuration loaded from the environment.

use std::fmt;
use std::time::Duration;

use gotify_client::Credentials;

use super::ConfigError;
use super::defaults::*;
use super::validation::validate_setting;
use crate::notification::NotificationSettings;

/// Runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub server_url: String,
    pub client_token: String,
    pub sound_notifications: bool,
    pub toast_notifications: bool,
    pub auto_reconnect: bool,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub age_refresh_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            client_token: String::new(),
            sound_notifications: DEFAULT_SOUND_NOTIFICATIONS,
            toast_notifications: DEFAULT_TOAST_NOTIFICATIONS,
            auto_reconnect: DEFAULT_AUTO_RECONNECT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            age_refresh_interval: Duration::from_secs(DEFAULT_AGE_REFRESH_SECS),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server_url", &self.server_url)
            .field("client_token", &"***")
            .field("sound_notifications", &self.sound_notifications)
            .field("toast_notifications", &self.toast_notifications)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("age_refresh_interval", &self.age_refresh_interval)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Invalid optional values are
    /// logged and replaced by their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> Option<String> {
            let value = lookup(key)?;
            if value.trim().is_empty() {
                return None;
            }
            match validate_setting(key, value.trim()) {
                Ok(()) => Some(value.trim().to_string()),
                Err(reason) if key == SERVER_URL || key == CLIENT_TOKEN => {
                    tracing::warn!(key, reason = %reason, "Invalid setting, keeping it for diagnostics");
                    Some(value)
                }
                Err(reason) => {
                    tracing::warn!(key, reason = %reason, "Invalid setting, using default");
                    None
                }
            }
        };

        let configured = ALL_KEYS.iter().filter(|&&key| lookup(key).is_some()).count();
        tracing::debug!(configured, total = ALL_KEYS.len(), "Settings found in environment");

        Self {
            server_url: g(SERVER_URL)
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or_default(),
            client_token: g(CLIENT_TOKEN)
                .map(|token| token.trim().to_string())
                .unwrap_or_default(),
            sound_notifications: parse_bool(g(SOUND_NOTIFICATIONS), DEFAULT_SOUND_NOTIFICATIONS),
            toast_notifications: parse_bool(g(TOAST_NOTIFICATIONS), DEFAULT_TOAST_NOTIFICATIONS),
            auto_reconnect: parse_bool(g(AUTO_RECONNECT), DEFAULT_AUTO_RECONNECT),
            request_timeout: parse_secs(g(REQUEST_TIMEOUT_SECS), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: parse_secs(g(CONNECT_TIMEOUT_SECS), DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: parse_secs(g(IDLE_TIMEOUT_SECS), DEFAULT_IDLE_TIMEOUT_SECS),
            age_refresh_interval: parse_secs(g(AGE_REFRESH_SECS), DEFAULT_AGE_REFRESH_SECS),
        }
    }

    /// Validated credentials for the engine.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if self.server_url.is_empty() {
            return Err(ConfigError::Missing(SERVER_URL));
        }
        if self.client_token.is_empty() {
            return Err(ConfigError::Missing(CLIENT_TOKEN));
        }
        validate_setting(SERVER_URL, &self.server_url).map_err(|reason| ConfigError::Invalid {
            key: SERVER_URL,
            reason,
        })?;
        validate_setting(CLIENT_TOKEN, &self.client_token).map_err(|reason| {
            ConfigError::Invalid {
                key: CLIENT_TOKEN,
                reason,
            }
        })?;
        Credentials::new(&self.server_url, &self.client_token).map_err(|e| ConfigError::Invalid {
            key: SERVER_URL,
            reason: e.to_string(),
        })
    }

    pub fn notification_settings(&self) -> NotificationSettings {
        NotificationSettings {
            sound_enabled: self.sound_notifications,
            toast_enabled: self.toast_notifications,
        }
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value.map(|v| v == "true").unwrap_or(default)
}

fn parse_secs(value: Option<String>, default: u64) -> Duration {
    Duration::from_secs(value.and_then(|v| v.parse().ok()).unwrap_or(default))
}
