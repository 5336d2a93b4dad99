//! Authorization Code Flow implementation.

use super::OAuthClient;
use crate::error::Result;
use crate::token::TokenResponse;
use url::Url;

/// Authorization Code Flow for `OAuth2`.
///
/// Every authorization URL asks for offline access and forces the consent
/// prompt, so the provider issues a refresh token even when the user has
/// authorized the application before.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Builds the authorization URL for user consent.
    ///
    /// Parameters are emitted in a fixed order so the URL is stable:
    /// `access_type`, `approval_prompt`, `client_id`, `redirect_uri`,
    /// `response_type`, `scope`.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str) -> Url {
        let mut url = self.client.provider.auth_url.clone();

        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("approval_prompt", "force")
            .append_pair("client_id", &self.client.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.client.provider.scope());

        url
    }

    /// Exchanges the authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        self.client.exchange_code(code, redirect_uri).await
    }
}
