//! Gmail REST API transport.

use async_trait::async_trait;
use gmailer_mime::Envelope;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{Connector, MailTransport, TransportError, TransportResult};
use crate::config::GMAIL_API_BASE_URL;
use crate::store::Credential;

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Transport using `users.messages.send` and `users.drafts.create`.
#[derive(Debug, Clone)]
pub struct GmailApi {
    http_client: Client,
    base_url: Url,
    authorization: String,
}

impl GmailApi {
    /// Creates a transport sending with `authorization` as the
    /// `Authorization` header value.
    #[must_use]
    pub fn new(http_client: Client, base_url: Url, authorization: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url,
            authorization: authorization.into(),
        }
    }

    /// `{base}/gmail/v1/users/{user}/{path...}`
    fn endpoint(&self, user: &str, path: &[&str]) -> TransportResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["gmail", "v1", "users", user])
            .extend(path);
        Ok(url)
    }

    async fn post(&self, url: Url, body: serde_json::Value) -> TransportResult<()> {
        debug!(%url, "calling Gmail API");
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(&body)
            .send()
            .await?;

        check_status(response).await
    }
}

/// Maps non-2xx responses to [`TransportError::Api`].
async fn check_status(response: Response) -> TransportResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    Err(TransportError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MailTransport for GmailApi {
    async fn send_raw(&self, user: &str, envelope: &Envelope) -> TransportResult<()> {
        let url = self.endpoint(user, &["messages", "send"])?;
        self.post(url, json!({ "raw": envelope.as_str() })).await
    }

    async fn create_draft(&self, user: &str, envelope: &Envelope) -> TransportResult<()> {
        let url = self.endpoint(user, &["drafts"])?;
        self.post(url, json!({ "message": { "raw": envelope.as_str() } }))
            .await
    }
}

/// Connects [`GmailApi`] transports using a credential's access token.
#[derive(Debug, Clone)]
pub struct GmailApiConnector {
    http_client: Client,
    base_url: Url,
}

impl GmailApiConnector {
    /// Creates a connector for the public Gmail API.
    ///
    /// # Errors
    ///
    /// See [`GmailApiConnector::new`].
    pub fn google() -> TransportResult<Self> {
        Self::new(GMAIL_API_BASE_URL)
    }

    /// Creates a connector for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot have a path.
    pub fn new(base_url: &str) -> TransportResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http_client: Client::new(),
            base_url,
        })
    }

    /// Uses a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Connector for GmailApiConnector {
    fn connect(&self, credential: &Credential) -> TransportResult<Box<dyn MailTransport>> {
        Ok(Box::new(GmailApi::new(
            self.http_client.clone(),
            self.base_url.clone(),
            credential.token.authorization_header(),
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api(base: &str) -> GmailApi {
        GmailApi::new(Client::new(), Url::parse(base).unwrap(), "Bearer t")
    }

    #[test]
    fn test_endpoints() {
        let api = api("https://gmail.googleapis.com");
        assert_eq!(
            api.endpoint("me", &["messages", "send"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );
        assert_eq!(
            api.endpoint("me", &["drafts"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/drafts"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api("http://127.0.0.1:8080/proxy/");
        assert_eq!(
            api.endpoint("user@example.com", &["drafts"]).unwrap().as_str(),
            "http://127.0.0.1:8080/proxy/gmail/v1/users/user@example.com/drafts"
        );
    }

    #[test]
    fn test_connector_rejects_bad_url() {
        assert!(GmailApiConnector::new("not a url").is_err());
        assert!(GmailApiConnector::new("mailto:a@b.com").is_err());
        assert_eq!(
            GmailApiConnector::google().unwrap().base_url().as_str(),
            "https://gmail.googleapis.com/"
        );
    }
}
