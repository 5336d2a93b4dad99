//! Error types for the core library.

use thiserror::Error;

use crate::config::ConfigError;
use crate::identity::Identity;
use crate::store::CredentialError;
use crate::transport::TransportError;

/// Errors that can occur in core operations.
///
/// Every variant aborts the current operation; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Storing a credential after a successful exchange failed.
    #[error("Credential store error for {identity}: {source}")]
    CredentialStore {
        /// Identity being written.
        identity: Identity,
        /// Underlying store failure.
        #[source]
        source: CredentialError,
    },

    /// No usable Gmail client could be built for an identity.
    #[error("Failed to initialise Gmail client for {identity}: {source}")]
    ClientInitialization {
        /// Identity the client was requested for.
        identity: Identity,
        /// Why the client could not be built.
        #[source]
        source: ClientError,
    },

    /// Exchanging an authorization code failed; the flow must restart.
    #[error("OAuth exchange failed for {identity}: {source}")]
    OAuthExchange {
        /// Identity being authorized.
        identity: Identity,
        /// Token endpoint failure.
        #[source]
        source: gmailer_oauth::Error,
    },

    /// An address or display name cannot be encoded.
    #[error("Address format error: {0}")]
    AddressFormat(#[source] gmailer_mime::Error),

    /// The MIME structure could not be assembled.
    #[error("Failed to build message ({summary}): {source}")]
    MimeConstruction {
        /// Message context for diagnosis.
        summary: String,
        /// Underlying MIME failure.
        #[source]
        source: gmailer_mime::Error,
    },

    /// The Gmail API rejected or failed the request.
    #[error("Failed to deliver {subject:?} to {recipients} via {identity}: {source}")]
    Delivery {
        /// Identity the message was sent as.
        identity: Identity,
        /// Recipients as `email,name` pairs.
        recipients: String,
        /// Message subject.
        subject: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },
}

impl Error {
    /// Returns true when the identity has no valid authorization: nothing
    /// stored, the refresh token was revoked, or the API answered 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::ClientInitialization { source, .. } => source.is_unauthorized(),
            Self::Delivery { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns true when the caller should send the user back through the
    /// consent flow for this identity.
    #[must_use]
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, Self::OAuthExchange { .. }) || self.is_unauthorized()
    }
}

/// Reasons a Gmail client could not be built.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Loading the stored credential failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Refreshing an expired access token failed.
    #[error("Token refresh failed: {0}")]
    Refresh(#[from] gmailer_oauth::Error),

    /// The transport rejected the credential.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns true when re-authorization is the only remedy.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Credential(e) => e.is_not_found(),
            Self::Refresh(e) => matches!(e.oauth_code(), Some("invalid_grant")),
            Self::Transport(e) => e.is_unauthorized(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
