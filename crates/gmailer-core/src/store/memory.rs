//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Credential, CredentialError, CredentialResult, CredentialStore};
use crate::identity::Identity;

/// Credential store that lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: RwLock<HashMap<Identity, Credential>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored identities in sorted order.
    pub async fn identities(&self) -> Vec<Identity> {
        let mut identities: Vec<Identity> =
            self.credentials.read().await.keys().cloned().collect();
        identities.sort();
        identities
    }

    /// Removes the credential for an identity, returning it if present.
    pub async fn remove(&self, identity: &Identity) -> Option<Credential> {
        self.credentials.write().await.remove(identity)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self, identity: &Identity) -> CredentialResult<Credential> {
        self.credentials
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound {
                identity: identity.clone(),
            })
    }

    async fn put(&self, credential: &Credential) -> CredentialResult<()> {
        self.credentials
            .write()
            .await
            .insert(credential.identity.clone(), credential.clone());
        debug!(identity = %credential.identity, "stored credential in memory");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gmailer_oauth::{Token, TokenResponse};

    fn response(access_token: &str) -> TokenResponse {
        TokenResponse {
            access_token: access_token.into(),
            token_type: "Bearer".into(),
            expires_in: Some(3600),
            refresh_token: Some("refresh".into()),
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_load_unknown_identity_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .load(&Identity::resolve(Some("nobody")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, CredentialError::NotFound { identity } if identity.as_str() == "nobody"));
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let store = MemoryStore::new();
        let identity = Identity::default();

        let stored = store.store(&identity, response("first")).await.unwrap();
        assert_eq!(stored.identity, identity);
        assert_eq!(stored.token.refresh_token.as_deref(), Some("refresh"));
        assert!(stored.token.expires_at.is_some());

        let loaded = store.load(&identity).await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let store = MemoryStore::new();
        let identity = Identity::resolve(Some("sales"));

        store.store(&identity, response("first")).await.unwrap();
        store.store(&identity, response("second")).await.unwrap();

        let loaded = store.load(&identity).await.unwrap();
        assert_eq!(loaded.token.access_token, "second");
        assert_eq!(store.identities().await, vec![identity]);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let store = MemoryStore::new();
        let sales = Identity::resolve(Some("sales"));
        let support = Identity::resolve(Some("support"));

        store
            .put(&Credential::new(sales.clone(), Token::new("a", "Bearer")))
            .await
            .unwrap();
        store
            .put(&Credential::new(support.clone(), Token::new("b", "Bearer")))
            .await
            .unwrap();

        assert_eq!(store.load(&sales).await.unwrap().token.access_token, "a");
        assert_eq!(store.remove(&support).await.unwrap().token.access_token, "b");
        assert!(store.load(&support).await.unwrap_err().is_not_found());
    }
}
