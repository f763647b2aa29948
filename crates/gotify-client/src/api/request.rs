use super::*;
use crate::{AUTH_HEADER, Credentials};

impl GotifyApiClient {
    /// Join an endpoint path onto the server base URL.
    pub(super) fn endpoint(credentials: &Credentials, path: &str) -> String {
        format!(
            "{}/{}",
            credentials.server_url(),
            path.trim_start_matches('/')
        )
    }

    /// Execute a GET request with the auth header and return the body.
    pub(super) async fn authenticated_get(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> Result<String, GotifyError> {
        let url = Self::endpoint(credentials, path);
        let resp = self
            .http
            .get(&url)
            .header(AUTH_HEADER, credentials.client_token())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %url, "Got 401, client token was rejected");
        }

        if !status.is_success() {
            return Err(GotifyError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}
