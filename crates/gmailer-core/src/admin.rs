//! Admin endpoints for connecting mailboxes.
//!
//! Two endpoints are exposed to whatever HTTP router hosts them:
//! - `gmail.admin.setup` at `{root}/setup` redirects to Google's consent page
//! - `gmail.admin.oauthCallback` at `{root}/oauth2callback` completes setup
//!
//! Both read the optional `credentialId` query parameter.

use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::config::DEFAULT_ADMIN_ROOT_PATH;
use crate::error::{Error, Result};
use crate::setup::SetupFlow;

/// Route name of the setup endpoint.
pub const SETUP_ROUTE: &str = "gmail.admin.setup";

/// Route name of the OAuth callback endpoint.
pub const OAUTH_CALLBACK_ROUTE: &str = "gmail.admin.oauthCallback";

/// Body returned once a mailbox is connected.
pub const SETUP_COMPLETE: &str = "Gmail setup complete";

/// Named routes of the admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRoutes {
    root: String,
}

impl AdminRoutes {
    /// Creates routes mounted under `root`.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the setup endpoint.
    #[must_use]
    pub fn setup_path(&self) -> String {
        format!("{}/setup", self.root)
    }

    /// Path of the OAuth callback endpoint.
    #[must_use]
    pub fn oauth_callback_path(&self) -> String {
        format!("{}/oauth2callback", self.root)
    }

    /// Looks up a route path by name.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<String> {
        match name {
            SETUP_ROUTE => Some(self.setup_path()),
            OAUTH_CALLBACK_ROUTE => Some(self.oauth_callback_path()),
            _ => None,
        }
    }

    /// All routes as `(name, path)` pairs, for registration with a router.
    #[must_use]
    pub fn all(&self) -> [(&'static str, String); 2] {
        [
            (SETUP_ROUTE, self.setup_path()),
            (OAUTH_CALLBACK_ROUTE, self.oauth_callback_path()),
        ]
    }
}

impl Default for AdminRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_ROOT_PATH)
    }
}

/// What an admin endpoint asks the host router to respond with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminResponse {
    /// Redirect the browser.
    Redirect(Url),
    /// Plain text body.
    Text(String),
}

/// Handlers for the admin endpoints.
#[derive(Debug, Clone)]
pub struct AdminController {
    flow: Arc<SetupFlow>,
}

impl AdminController {
    /// Creates the controller.
    #[must_use]
    pub const fn new(flow: Arc<SetupFlow>) -> Self {
        Self { flow }
    }

    /// Starts setup by redirecting to the consent page.
    ///
    /// `credential_id` names the mailbox; pass distinct ids to connect
    /// several mailboxes.
    #[must_use]
    pub fn setup(&self, credential_id: Option<&str>) -> AdminResponse {
        AdminResponse::Redirect(self.flow.authorization_url(credential_id))
    }

    /// Completes setup after Google redirects back with a code.
    ///
    /// A rejected code sends the user back to the consent page for the same
    /// mailbox, since codes are single use.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be stored.
    pub async fn oauth_callback(
        &self,
        code: &str,
        credential_id: Option<&str>,
    ) -> Result<AdminResponse> {
        match self.flow.handle_callback(code, credential_id).await {
            Ok(_) => Ok(AdminResponse::Text(SETUP_COMPLETE.to_string())),
            Err(Error::OAuthExchange { identity, source }) => {
                warn!(%identity, "code exchange failed, restarting consent: {source}");
                Ok(AdminResponse::Redirect(
                    self.flow.authorization_url(credential_id),
                ))
            }
            Err(e) => Err(e),
        }
    }
}
