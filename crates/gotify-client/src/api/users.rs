use super::*;
use crate::Credentials;

impl GotifyApiClient {
    /// Fetch the user owning the token.
    ///
    /// Used as a connection check before the first stream connect: a
    /// non-success status surfaces as `GotifyError::ApiError` carrying the
    /// server's response body.
    pub async fn current_user(&self, credentials: &Credentials) -> Result<CurrentUser, GotifyError> {
        let body = self.authenticated_get(credentials, "current/user").await?;
        let user: CurrentUser = serde_json::from_str(&body)?;
        tracing::info!(user = %user.name, "Gotify connection check succeeded");
        Ok(user)
    }
}
