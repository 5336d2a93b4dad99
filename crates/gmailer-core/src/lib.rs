//! # gmailer-core
//!
//! Gmail setup and delivery for applications sending mail as one or more
//! Gmail mailboxes.
//!
//! This crate provides:
//! - **Credential storage** - tokens kept per mailbox identity, in the OS
//!   keyring or in memory
//! - **Setup flow** - the authorization-code handshake that connects a
//!   mailbox, plus the admin endpoints driving it
//! - **Mailer** - deterministic MIME composition and delivery through the
//!   Gmail API, as sent mail or as a draft
//!
//! ```no_run
//! use std::sync::Arc;
//! use gmailer_core::{Email, GmailConfig, GmailMailer, KeyringStore, Mailbox, Rendered};
//!
//! # async fn run() -> gmailer_core::Result<()> {
//! let config = GmailConfig::from_env()?;
//! let mailer = GmailMailer::from_config(&config, Arc::new(KeyringStore::new()))?;
//!
//! let email = Email::new(Mailbox::new("me@example.com"))
//!     .to("you@example.com", Some("You"))
//!     .subject("Hello")
//!     .body(Rendered::html("<p>Hello</p>"));
//! mailer.send(&email, None).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admin;
pub mod config;
mod error;
mod identity;
pub mod mailer;
pub mod setup;
pub mod store;
pub mod transport;

pub use admin::{AdminController, AdminResponse, AdminRoutes};
pub use config::{ConfigError, GmailConfig};
pub use error::{ClientError, Error, Result};
pub use identity::{DEFAULT_IDENTITY, Identity};
pub use mailer::{Attachment, Email, GmailMailer, Mailbox, Recipients, Rendered, compose};
pub use setup::SetupFlow;
pub use store::{Credential, CredentialError, CredentialStore, KeyringStore, MemoryStore};
pub use transport::{
    AUTHENTICATED_USER, Connector, GmailApi, GmailApiConnector, MailTransport, TransportError,
};

pub use gmailer_mime::{Disposition, Envelope};
