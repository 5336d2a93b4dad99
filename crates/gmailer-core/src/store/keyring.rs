//! Secure credential storage using the system keyring.
//!
//! Tokens are stored as JSON in the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use async_trait::async_trait;
use gmailer_oauth::Token;
use keyring::Entry;
use tracing::{debug, warn};

use super::{Credential, CredentialError, CredentialResult, CredentialStore};
use crate::identity::Identity;

/// Default service name for keyring entries.
pub const DEFAULT_SERVICE_NAME: &str = "gmailer";

/// Credential store backed by the system keyring, one entry per identity.
///
/// Keyring calls block, so they run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Creates a store using the default service name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE_NAME)
    }

    /// Creates a store under a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Returns the service name entries are stored under.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Deletes the credential for an identity. Missing entries are not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub async fn delete(&self, identity: &Identity) -> CredentialResult<()> {
        let service = self.service.clone();
        let user = identity.clone();

        let result =
            tokio::task::spawn_blocking(move || Entry::new(&service, user.as_str())?.delete_credential())
                .await?;

        match result {
            Ok(()) => {
                debug!(%identity, "deleted credential from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(%identity, "no credential to delete");
                Ok(())
            }
            Err(e) => {
                warn!(%identity, "failed to delete credential: {e}");
                Err(CredentialError::backend(e))
            }
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for KeyringStore {
    async fn load(&self, identity: &Identity) -> CredentialResult<Credential> {
        let service = self.service.clone();
        let user = identity.clone();

        let result =
            tokio::task::spawn_blocking(move || Entry::new(&service, user.as_str())?.get_password())
                .await?;

        match result {
            Ok(token_json) => {
                let token: Token = serde_json::from_str(&token_json)?;
                debug!(%identity, "loaded credential from keyring");
                Ok(Credential::new(identity.clone(), token))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(%identity, "no credential found in keyring");
                Err(CredentialError::NotFound {
                    identity: identity.clone(),
                })
            }
            Err(e) => Err(CredentialError::backend(e)),
        }
    }

    async fn put(&self, credential: &Credential) -> CredentialResult<()> {
        let token_json = serde_json::to_string(&credential.token)?;
        let service = self.service.clone();
        let user = credential.identity.clone();

        tokio::task::spawn_blocking(move || {
            Entry::new(&service, user.as_str())?.set_password(&token_json)
        })
        .await?
        .map_err(CredentialError::backend)?;

        debug!(identity = %credential.identity, "stored credential in keyring");
        Ok(())
    }
}
