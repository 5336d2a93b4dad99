//! `OAuth2` authorization flows.

mod code;

pub use code::AuthorizationCodeFlow;

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::{Client, Response};
use std::collections::HashMap;
use tracing::debug;

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Uses a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.client_id);

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let mut new_token = Token::from_response(read_token_response(response).await?);

        // Google only returns a refresh token on the first exchange
        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }

        Ok(new_token)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// `redirect_uri` must be identical to the one sent in the authorization
    /// request or the provider rejects the exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &self.client_id);
        params.insert("redirect_uri", redirect_uri);

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        debug!(token_url = %self.provider.token_url, redirect_uri, "exchanging authorization code");

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        read_token_response(response).await
    }
}

/// Decodes a token endpoint response, turning non-2xx replies into
/// [`Error::OAuth`] when the body follows RFC 6749 §5.2.
async fn read_token_response(response: Response) -> Result<TokenResponse> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(serde_json::from_str::<ErrorResponse>(&body).map_or_else(
            |_| Error::InvalidResponse(format!("{status}: {body}")),
            ErrorResponse::into_error,
        ));
    }

    let token_response: TokenResponse = serde_json::from_str(&body)?;
    if token_response.access_token.is_empty() {
        return Err(Error::InvalidResponse("empty access_token".into()));
    }
    Ok(token_response)
}
