use super::*;
use crate::Credentials;

impl GotifyApiClient {
    /// List the applications visible to this client token.
    pub async fn applications(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Application>, GotifyError> {
        let body = self.authenticated_get(credentials, "application").await?;
        let apps: Vec<Application> = serde_json::from_str(&body)?;
        tracing::debug!(count = apps.len(), "Fetched application list");
        Ok(apps)
    }
}
