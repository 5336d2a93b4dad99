//! OAuth2 setup flow for mailbox identities.
//!
//! Authorization is a redirect round trip: [`SetupFlow::authorization_url`]
//! sends the user to Google's consent page, and Google calls back with a
//! `code` that [`SetupFlow::handle_callback`] exchanges for tokens. The
//! identity being authorized travels in the `credentialId` query parameter
//! of the redirect URI, so no state is kept between the two calls.

use std::sync::Arc;

use gmailer_oauth::AuthorizationCodeFlow;
use tracing::{debug, info};
use url::Url;

use crate::config::GmailConfig;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::store::CredentialStore;

/// Query parameter carrying the identity on the callback URL.
pub const CREDENTIAL_ID_PARAM: &str = "credentialId";

/// Builds authorization URLs and completes the code exchange.
///
/// One value serves the whole application; it is immutable after
/// construction and can be shared behind an [`Arc`].
pub struct SetupFlow {
    flow: AuthorizationCodeFlow,
    store: Arc<dyn CredentialStore>,
    callback_url: String,
}

impl SetupFlow {
    /// Creates the flow from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid;
    /// no URL is built in that case.
    pub fn new(config: &GmailConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;
        let flow = AuthorizationCodeFlow::new(config.oauth_client()?);
        Ok(Self::from_parts(flow, config.callback_url(), store))
    }

    /// Creates the flow from an already configured OAuth flow and the
    /// absolute callback URL.
    #[must_use]
    pub fn from_parts(
        flow: AuthorizationCodeFlow,
        callback_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            flow,
            store,
            callback_url: callback_url.into(),
        }
    }

    /// Absolute URL of the callback endpoint, without parameters.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Redirect URI for an identity.
    ///
    /// A non-blank identity is appended verbatim as `?credentialId=<identity>`;
    /// otherwise the bare callback URL is used. The token exchange must send
    /// exactly the same string or Google rejects it.
    #[must_use]
    pub fn redirect_uri(&self, identity: Option<&str>) -> String {
        match identity {
            Some(id) if !id.trim().is_empty() => {
                format!("{}?{CREDENTIAL_ID_PARAM}={id}", self.callback_url)
            }
            _ => self.callback_url.clone(),
        }
    }

    /// Consent page URL requesting offline access with forced re-consent.
    #[must_use]
    pub fn authorization_url(&self, identity: Option<&str>) -> Url {
        self.flow.authorization_url(&self.redirect_uri(identity))
    }

    /// Exchanges an authorization code and stores the credential.
    ///
    /// Returns the resolved identity the credential was stored under.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuthExchange`] if the token endpoint rejects the
    /// code, or [`Error::CredentialStore`] if the credential cannot be saved.
    /// Neither is retried; the user has to restart from the consent page.
    pub async fn handle_callback(&self, code: &str, identity: Option<&str>) -> Result<Identity> {
        let redirect_uri = self.redirect_uri(identity);
        let resolved = Identity::resolve(identity);
        debug!(identity = %resolved, "handling OAuth callback");

        let response = self
            .flow
            .exchange_code(code, &redirect_uri)
            .await
            .map_err(|source| Error::OAuthExchange {
                identity: resolved.clone(),
                source,
            })?;

        self.store
            .store(&resolved, response)
            .await
            .map_err(|source| Error::CredentialStore {
                identity: resolved.clone(),
                source,
            })?;

        info!(identity = %resolved, "Gmail setup complete");
        Ok(resolved)
    }
}

impl std::fmt::Debug for SetupFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupFlow")
            .field("client_id", &self.flow.client().client_id)
            .field("callback_url", &self.callback_url)
            .finish_non_exhaustive()
    }
}
