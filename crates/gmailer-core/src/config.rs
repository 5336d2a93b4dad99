//! Gmail integration configuration.
//!
//! Properties are read through a lookup function so any source can supply
//! them; [`GmailConfig::from_env`] maps them to environment variables.
//!
//! | property | environment | required |
//! |---|---|---|
//! | `host` | `GMAILER_HOST` | yes |
//! | `gmailOAuthClientId` | `GMAILER_CLIENT_ID` | yes |
//! | `gmailOAuthClientSecret` | `GMAILER_CLIENT_SECRET` | yes |
//! | `gmailAdminRootPath` | `GMAILER_ADMIN_ROOT_PATH` | no, `/admin/gmail` |

use std::fmt;

use gmailer_oauth::{OAuthClient, Provider};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::admin::AdminRoutes;

/// Default mount point for the admin endpoints.
pub const DEFAULT_ADMIN_ROOT_PATH: &str = "/admin/gmail";

/// Default Gmail API base URL.
pub const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Property holding the externally reachable host, e.g. `https://example.com`.
pub const HOST_PROPERTY: &str = "host";
/// Property holding the OAuth client id.
pub const CLIENT_ID_PROPERTY: &str = "gmailOAuthClientId";
/// Property holding the OAuth client secret.
pub const CLIENT_SECRET_PROPERTY: &str = "gmailOAuthClientSecret";
/// Property holding the admin root path.
pub const ADMIN_ROOT_PATH_PROPERTY: &str = "gmailAdminRootPath";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required property is absent or blank.
    #[error("Missing required property: {0}")]
    MissingProperty(String),

    /// A property is present but unusable.
    #[error("Invalid property {name}: {reason}")]
    InvalidProperty {
        /// Property name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidProperty {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Settings shared by the setup flow and the mailer.
#[derive(Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    /// External base URL of this application, without a trailing slash.
    pub host: String,
    /// OAuth client id.
    #[serde(rename = "gmailOAuthClientId")]
    pub client_id: String,
    /// OAuth client secret.
    #[serde(rename = "gmailOAuthClientSecret")]
    pub client_secret: String,
    /// Path the admin endpoints are mounted under.
    #[serde(rename = "gmailAdminRootPath", default = "default_admin_root_path")]
    pub admin_root_path: String,
    /// Authorization endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    /// Token endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Gmail API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_admin_root_path() -> String {
    DEFAULT_ADMIN_ROOT_PATH.to_string()
}

fn default_api_base_url() -> String {
    GMAIL_API_BASE_URL.to_string()
}

impl GmailConfig {
    /// Creates a configuration with default paths and Google endpoints.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            admin_root_path: default_admin_root_path(),
            auth_url: None,
            token_url: None,
            api_base_url: default_api_base_url(),
        }
    }

    /// Sets the admin root path.
    #[must_use]
    pub fn with_admin_root_path(mut self, path: impl Into<String>) -> Self {
        self.admin_root_path = path.into();
        self
    }

    /// Overrides the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Overrides the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Overrides the Gmail API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Reads and validates the configuration from named properties.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProperty`] for the first required
    /// property that is absent, or [`ConfigError::InvalidProperty`] if
    /// validation fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::MissingProperty(name.into()));

        let host = require(HOST_PROPERTY)?;
        let client_id = require(CLIENT_ID_PROPERTY)?;
        let client_secret = require(CLIENT_SECRET_PROPERTY)?;

        let mut config = Self::new(host, client_id, client_secret);
        match get(ADMIN_ROOT_PATH_PROPERTY) {
            Some(path) => config.admin_root_path = path,
            None => info!(
                "{ADMIN_ROOT_PATH_PROPERTY} not specified, defaulting to {DEFAULT_ADMIN_ROOT_PATH}"
            ),
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from `GMAILER_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`GmailConfig::from_lookup`]; errors name the property, not the
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            let var = match name {
                HOST_PROPERTY => "GMAILER_HOST",
                CLIENT_ID_PROPERTY => "GMAILER_CLIENT_ID",
                CLIENT_SECRET_PROPERTY => "GMAILER_CLIENT_SECRET",
                ADMIN_ROOT_PATH_PROPERTY => "GMAILER_ADMIN_ROOT_PATH",
                _ => return None,
            };
            std::env::var(var).ok()
        })
    }

    /// Checks that every value can be used to build URLs and clients.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingProperty(HOST_PROPERTY.into()));
        }
        let host = Url::parse(&self.host).map_err(|e| ConfigError::invalid(HOST_PROPERTY, e))?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                HOST_PROPERTY,
                format!("unsupported scheme {}", host.scheme()),
            ));
        }
        if self.host.ends_with('/') {
            return Err(ConfigError::invalid(
                HOST_PROPERTY,
                "must not end with a slash",
            ));
        }

        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingProperty(CLIENT_ID_PROPERTY.into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::MissingProperty(CLIENT_SECRET_PROPERTY.into()));
        }

        if !self.admin_root_path.starts_with('/') {
            return Err(ConfigError::invalid(
                ADMIN_ROOT_PATH_PROPERTY,
                "must start with a slash",
            ));
        }

        Url::parse(&self.api_base_url).map_err(|e| ConfigError::invalid("api_base_url", e))?;
        self.provider()?;
        Ok(())
    }

    /// Routes for the admin endpoints under the configured root.
    #[must_use]
    pub fn routes(&self) -> AdminRoutes {
        AdminRoutes::new(&self.admin_root_path)
    }

    /// Absolute URL of the OAuth callback endpoint.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.host, self.routes().oauth_callback_path())
    }

    /// Google provider with the `gmail.compose` scope and any endpoint
    /// overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is not a valid URL.
    pub fn provider(&self) -> Result<Provider, ConfigError> {
        let google = Provider::google().map_err(|e| ConfigError::invalid("provider", e))?;
        if self.auth_url.is_none() && self.token_url.is_none() {
            return Ok(google);
        }

        let auth_url = self
            .auth_url
            .as_deref()
            .unwrap_or(google.auth_url.as_str());
        let token_url = self
            .token_url
            .as_deref()
            .unwrap_or(google.token_url.as_str());

        let provider = Provider::new(google.name.as_str(), auth_url, token_url)
            .map_err(|e| ConfigError::invalid("auth_url/token_url", e))?
            .with_scopes(google.scopes.clone());
        provider
            .validate()
            .map_err(|e| ConfigError::invalid("auth_url/token_url", e))?;
        Ok(provider)
    }

    /// OAuth client for this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be built.
    pub fn oauth_client(&self) -> Result<OAuthClient, ConfigError> {
        Ok(OAuthClient::new(&self.client_id, self.provider()?)
            .with_client_secret(&self.client_secret))
    }
}

impl fmt::Debug for GmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GmailConfig")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("admin_root_path", &self.admin_root_path)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}
