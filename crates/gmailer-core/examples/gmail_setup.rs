#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: connect a Gmail mailbox and send a test message
//!
//! 1. Prints the consent URL for the mailbox
//! 2. After consent, Google redirects to the configured callback; paste the
//!    `code` query parameter from that URL
//! 3. The token is stored in the OS keyring under the mailbox identity
//! 4. Optionally sends a test message to `GMAILER_TEST_TO`
//!
//! ## Running
//!
//! ```bash
//! export GMAILER_HOST="https://app.example.com"
//! export GMAILER_CLIENT_ID="your-client-id.apps.googleusercontent.com"
//! export GMAILER_CLIENT_SECRET="your-client-secret"
//! export GMAILER_TEST_TO="you@example.com"   # optional
//! cargo run --package gmailer-core --example gmail_setup -- sales@example.com
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use gmailer_core::{
    Email, GmailConfig, GmailMailer, KeyringStore, Mailbox, Rendered, SetupFlow,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gmailer_core=debug,gmailer_oauth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let identity = std::env::args().nth(1);
    let config = GmailConfig::from_env().context("reading GMAILER_* configuration")?;
    let store = Arc::new(KeyringStore::new());

    let flow = SetupFlow::new(&config, store.clone())?;
    println!("Gmail setup");
    println!("===========\n");
    println!("Open this URL and grant access:\n");
    println!("  {}\n", flow.authorization_url(identity.as_deref()));
    print!("Paste the `code` parameter from the callback URL: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;
    let code = code.trim();
    anyhow::ensure!(!code.is_empty(), "no authorization code entered");

    let resolved = flow.handle_callback(code, identity.as_deref()).await?;
    info!(identity = %resolved, "credential stored");
    println!("\n✓ Stored credential for {resolved}");

    let Ok(to) = std::env::var("GMAILER_TEST_TO") else {
        return Ok(());
    };

    let mailer = GmailMailer::from_config(&config, store)?;
    let email = Email::new(Mailbox::new(to.as_str()))
        .to(to.as_str(), None)
        .subject("gmailer test message")
        .body(Rendered::html(format!(
            "<p>Sent as <b>{}</b>.</p>",
            resolved
        )));

    mailer.send(&email, Some(resolved.as_str())).await?;
    println!("✓ Test message sent to {to}");
    Ok(())
}
