//! Sending mail through the Gmail API.

mod compose;
mod email;

pub use compose::{compose, format_address};
pub use email::{Attachment, Email, Mailbox, Recipients, Rendered};

use std::sync::Arc;

use gmailer_oauth::OAuthClient;
use tracing::{debug, error, info, warn};

use crate::config::GmailConfig;
use crate::error::{ClientError, Error, Result};
use crate::identity::Identity;
use crate::store::{Credential, CredentialStore};
use crate::transport::{AUTHENTICATED_USER, Connector, GmailApiConnector, MailTransport};

/// Remote operation performed with a composed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Send,
    Draft,
}

/// Composes emails and delivers them as a stored mailbox identity.
///
/// A client is built per call from the identity's stored credential;
/// nothing is cached between calls.
pub struct GmailMailer {
    store: Arc<dyn CredentialStore>,
    connector: Arc<dyn Connector>,
    oauth: Option<OAuthClient>,
}

impl GmailMailer {
    /// Creates a mailer. Without an OAuth client, expired tokens are used
    /// as they are.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, connector: Arc<dyn Connector>) -> Self {
        Self {
            store,
            connector,
            oauth: None,
        }
    }

    /// Creates a mailer talking to the configured Gmail API, refreshing
    /// expired tokens with the configured OAuth client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid.
    pub fn from_config(config: &GmailConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;
        let connector = GmailApiConnector::new(&config.api_base_url).map_err(|e| {
            crate::config::ConfigError::InvalidProperty {
                name: "api_base_url".into(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::new(store, Arc::new(connector)).with_oauth_client(config.oauth_client()?))
    }

    /// Enables token refresh with `client`.
    #[must_use]
    pub fn with_oauth_client(mut self, client: OAuthClient) -> Self {
        self.oauth = Some(client);
        self
    }

    /// Sends an email as `identity`, or as the default identity if none is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientInitialization`] if no usable credential is
    /// stored, [`Error::AddressFormat`] or [`Error::MimeConstruction`] if the
    /// email cannot be composed, and [`Error::Delivery`] if Gmail rejects it.
    pub async fn send(&self, email: &Email, identity: Option<&str>) -> Result<()> {
        self.dispatch(email, Identity::resolve(identity), Verb::Send)
            .await
    }

    /// Saves an email as a draft in the mailbox of `identity`.
    ///
    /// # Errors
    ///
    /// Same as [`GmailMailer::send`].
    pub async fn create_draft(&self, email: &Email, identity: &str) -> Result<()> {
        self.dispatch(email, Identity::resolve(Some(identity)), Verb::Draft)
            .await
    }

    async fn dispatch(&self, email: &Email, identity: Identity, verb: Verb) -> Result<()> {
        let client = self.client(&identity).await?;
        let envelope = compose(email)?;
        debug!(%identity, ?verb, bytes = envelope.as_str().len(), "dispatching message");

        let result = match verb {
            Verb::Send => client.send_raw(AUTHENTICATED_USER, &envelope).await,
            Verb::Draft => client.create_draft(AUTHENTICATED_USER, &envelope).await,
        };

        match result {
            Ok(()) => {
                info!(%identity, ?verb, subject = %email.subject, "message delivered");
                Ok(())
            }
            Err(source) => {
                error!(%identity, ?verb, "failed to send email: {source}");
                Err(Error::Delivery {
                    identity,
                    recipients: email.recipient_summary(),
                    subject: email.subject.clone(),
                    source,
                })
            }
        }
    }

    /// Loads the identity's credential, refreshing it when it has expired.
    async fn client(&self, identity: &Identity) -> Result<Box<dyn MailTransport>> {
        let init_error = |source: ClientError| {
            error!(%identity, "error loading stored credential: {source}");
            Error::ClientInitialization {
                identity: identity.clone(),
                source,
            }
        };

        let credential = self
            .store
            .load(identity)
            .await
            .map_err(|e| init_error(e.into()))?;
        let credential = self
            .refresh_if_expired(credential)
            .await
            .map_err(init_error)?;

        self.connector
            .connect(&credential)
            .map_err(|e| init_error(e.into()))
    }

    async fn refresh_if_expired(
        &self,
        credential: Credential,
    ) -> std::result::Result<Credential, ClientError> {
        if !credential.token.is_expired() {
            return Ok(credential);
        }

        let Some(oauth) = &self.oauth else {
            warn!(identity = %credential.identity, "access token expired and refresh is not configured");
            return Ok(credential);
        };
        if credential.token.refresh_token.is_none() {
            warn!(identity = %credential.identity, "access token expired and no refresh token is stored");
            return Ok(credential);
        }

        debug!(identity = %credential.identity, "refreshing expired access token");
        let token = oauth.refresh_token(&credential.token).await?;
        let refreshed = Credential::new(credential.identity, token);
        self.store.put(&refreshed).await?;
        Ok(refreshed)
    }
}

impl std::fmt::Debug for GmailMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailMailer")
            .field("refresh", &self.oauth.is_some())
            .finish_non_exhaustive()
    }
}
