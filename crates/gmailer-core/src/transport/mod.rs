//! Delivery transports.
//!
//! A [`Connector`] turns a stored credential into a [`MailTransport`] bound
//! to that credential. The Gmail REST API implementation lives in
//! [`gmail`]; tests substitute their own.

pub mod gmail;

pub use gmail::{GmailApi, GmailApiConnector};

use async_trait::async_trait;
use gmailer_mime::Envelope;

use crate::store::Credential;

/// User id the Gmail API resolves to the authenticated mailbox.
pub const AUTHENTICATED_USER: &str = "me";

/// Errors that can occur during delivery.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("Gmail API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The configured API base URL cannot be used.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Returns true if the API rejected the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Sends encoded messages on behalf of one authenticated mailbox.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message was not accepted.
    async fn send_raw(&self, user: &str, envelope: &Envelope) -> TransportResult<()>;

    /// Saves a message as a draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft was not created.
    async fn create_draft(&self, user: &str, envelope: &Envelope) -> TransportResult<()>;
}

/// Builds transports bound to a credential.
pub trait Connector: Send + Sync {
    /// Creates a transport authenticated with `credential`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be used.
    fn connect(&self, credential: &Credential) -> TransportResult<Box<dyn MailTransport>>;
}
