//! Shared HTTP client for provider APIs and career pages.

use std::time::Duration;

use crate::config::Config;
use crate::sources::SourceError;

/// Browser-like User-Agent; career sites often refuse obvious bots.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Build the [`reqwest::Client`] shared by all source adapters.
///
/// The client-wide timeout matches the per-source bound; the collector
/// enforces the same bound independently.
pub fn build_client(config: &Config) -> Result<reqwest::Client, SourceError> {
    build_client_with_timeout(config.source_timeout())
}

pub fn build_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}

/// Sends a request and reads a JSON body, mapping non-2xx to [`SourceError::Status`].
pub async fn send_json<T>(request: reqwest::RequestBuilder) -> Result<T, SourceError>
where
    T: serde::de::DeserializeOwned,
{
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Payload(e.to_string()))
}
