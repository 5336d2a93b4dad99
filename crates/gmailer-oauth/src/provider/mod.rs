//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Scope that allows creating drafts and sending mail, nothing else.
pub const GMAIL_COMPOSE_SCOPE: &str = "https://www.googleapis.com/auth/gmail.compose";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Scopes requested on every authorization.
    pub scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            scopes: Vec::new(),
        })
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Google `OAuth2` provider configuration.
    ///
    /// Scopes:
    /// - `https://www.googleapis.com/auth/gmail.compose` - drafts and sending
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_scopes(vec![GMAIL_COMPOSE_SCOPE.to_string()]))
    }

    /// Space separated scope string as sent in the `scope` parameter.
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Validates that the endpoints and scopes are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        for (label, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{label} must be an http(s) URL, got {url}"
                )));
            }
        }
        if self.scopes.is_empty() {
            return Err(Error::InvalidConfig("no scopes configured".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(provider.scope(), GMAIL_COMPOSE_SCOPE);
        assert_eq!(
            provider.auth_url.as_str(),
            "https://accounts.google.com/o/oauth2/auth"
        );
        provider.validate().unwrap();
    }

    #[test]
    fn test_custom_provider() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap()
        .with_scopes(vec!["email".to_string(), "profile".to_string()]);

        assert_eq!(provider.name, "Custom");
        assert_eq!(provider.scope(), "email profile");
        provider.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_scopes() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let provider = Provider::new("Custom", "ftp://auth.example.com/", "https://x.example/t")
            .unwrap()
            .with_scopes(vec!["email".to_string()]);
        assert!(provider.validate().is_err());
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            Provider::new("Broken", "not a url", "https://x.example/t"),
            Err(Error::UrlError(_))
        ));
    }
}
