//! # gmailer-oauth
//!
//! `OAuth2` authorization-code flow for Gmail mailbox identities.
//!
//! ## Features
//!
//! - **Authorization URLs**: offline access with forced re-consent, so a
//!   refresh token is issued on every authorization
//! - **Code exchange**: trades the callback `code` for a [`TokenResponse`]
//! - **Token management**: expiry checks and refresh
//! - **Provider configuration**: Google endpoints with the `gmail.compose`
//!   scope, or any custom endpoint pair
//!
//! ## Quick Start
//!
//! ```ignore
//! use gmailer_oauth::{AuthorizationCodeFlow, OAuthClient, Provider, Token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new("your_client_id", Provider::google()?)
//!         .with_client_secret("your_secret");
//!     let flow = AuthorizationCodeFlow::new(client);
//!
//!     let redirect_uri = "https://example.com/admin/gmail/oauth2callback";
//!     println!("Visit: {}", flow.authorization_url(redirect_uri));
//!
//!     // The redirect URI must match the one used above byte for byte.
//!     let response = flow.exchange_code("code_from_callback", redirect_uri).await?;
//!     let token = Token::from_response(response);
//!     println!("Access token expires at {:?}", token.expires_at);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient};
pub use provider::Provider;
pub use token::{Token, TokenResponse};
