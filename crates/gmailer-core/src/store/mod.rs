//! Credential storage keyed by mailbox identity.
//!
//! The [`CredentialStore`] trait is the seam between the setup flow, which
//! writes credentials, and the mailer, which reads them. Two stores ship
//! with the crate:
//! - [`KeyringStore`]: the platform's native credential storage
//! - [`MemoryStore`]: process-local, for embedding and tests

mod keyring;
mod memory;

pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

use async_trait::async_trait;
use gmailer_oauth::{Token, TokenResponse};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// OAuth2 token material stored for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Identity the token belongs to.
    pub identity: Identity,
    /// Access and refresh token.
    pub token: Token,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub const fn new(identity: Identity, token: Token) -> Self {
        Self { identity, token }
    }
}

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The identity has never been authorized.
    #[error("No credential stored for {identity}")]
    NotFound {
        /// Identity that was looked up.
        identity: Identity,
    },

    /// The backing store failed.
    #[error("Credential backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored data could not be (de)serialized.
    #[error("Corrupt credential data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("Credential task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CredentialError {
    /// Wraps a backend failure.
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }

    /// Returns true if nothing is stored for the identity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Persists OAuth2 credentials keyed by identity.
///
/// Writes overwrite: when two writers race on one identity the last one wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the credential stored for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NotFound`] if the identity was never
    /// authorized, or another variant if the store itself failed.
    async fn load(&self, identity: &Identity) -> CredentialResult<Credential>;

    /// Writes a credential, replacing any previous one for its identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn put(&self, credential: &Credential) -> CredentialResult<()>;

    /// Builds a credential from a token endpoint response and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn store(
        &self,
        identity: &Identity,
        response: TokenResponse,
    ) -> CredentialResult<Credential> {
        let credential = Credential::new(identity.clone(), Token::from_response(response));
        self.put(&credential).await?;
        Ok(credential)
    }
}
