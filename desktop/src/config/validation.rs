//! Setting value validation.

use super::defaults::*;

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        SERVER_URL => {
            let url = value.trim();
            if url.is_empty() {
                return Err("must not be empty".into());
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("must start with http:// or https://".into());
            }
        }
        CLIENT_TOKEN => {
            if value.trim().is_empty() {
                return Err("must not be empty".into());
            }
            if value.trim().chars().any(char::is_whitespace) {
                return Err("must not contain whitespace".into());
            }
        }
        REQUEST_TIMEOUT_SECS | CONNECT_TIMEOUT_SECS => validate_int_range(value, 1, 120)?,
        IDLE_TIMEOUT_SECS => validate_int_range(value, 10, 3600)?,
        AGE_REFRESH_SECS => validate_int_range(value, 1, 3600)?,
        // Boolean settings
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: u64, max: u64) -> Result<(), String> {
    let v: u64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

fn is_boolean_setting(key: &str) -> bool {
    matches!(
        key,
        SOUND_NOTIFICATIONS | TOAST_NOTIFICATIONS | AUTO_RECONNECT
    )
}
