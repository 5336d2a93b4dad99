//! Sending and drafting against a mock Gmail API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use gmailer_core::{
    Attachment, Credential, CredentialStore, Email, Error, GmailConfig, GmailMailer, Identity,
    Mailbox, MemoryStore, Rendered, TransportError, compose,
};
use gmailer_oauth::Token;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> GmailConfig {
    GmailConfig::new("https://app.example.com", "client-id", "client-secret")
        .with_api_base_url(server.uri())
        .with_token_url(format!("{}/token", server.uri()))
}

fn email() -> Email {
    Email::new(Mailbox::new("noreply@example.com").with_name("Example"))
        .to("alice@example.com", Some("Alice"))
        .cc("bob@example.com", None)
        .subject("Quarterly report")
        .body(Rendered::html("<p>Attached.</p>"))
        .attach(Attachment::new(
            "report.pdf",
            Rendered::new(b"%PDF-1.4".to_vec(), "application/pdf"),
        ))
}

async fn store_token(store: &MemoryStore, identity: &str, token: Token) {
    store
        .put(&Credential::new(Identity::resolve(Some(identity)), token))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_posts_raw_envelope() {
    let server = MockServer::start().await;
    let raw = compose(&email()).unwrap().into_inner();
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/messages/send"))
        .and(header("authorization", "Bearer ya29.default"))
        .and(body_json(json!({ "raw": raw })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "18c1" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store_token(&store, "gmail-credentials", Token::new("ya29.default", "Bearer")).await;
    let mailer = GmailMailer::from_config(&config(&server), store).unwrap();

    mailer.send(&email(), None).await.unwrap();
}

#[tokio::test]
async fn test_create_draft_wraps_message() {
    let server = MockServer::start().await;
    let raw = compose(&email()).unwrap().into_inner();
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/drafts"))
        .and(header("authorization", "Bearer ya29.sales"))
        .and(body_json(json!({ "message": { "raw": raw } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "r-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store_token(&store, "sales@example.com", Token::new("ya29.sales", "Bearer")).await;
    let mailer = GmailMailer::from_config(&config(&server), store).unwrap();

    mailer
        .create_draft(&email(), " Sales@Example.com ")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unauthorized_response_maps_to_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "Invalid Credentials", "status": "UNAUTHENTICATED" }
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store_token(&store, "gmail-credentials", Token::new("revoked", "Bearer")).await;
    let mailer = GmailMailer::from_config(&config(&server), store).unwrap();

    let err = mailer.send(&email(), None).await.unwrap_err();
    assert!(err.is_unauthorized());
    match err {
        Error::Delivery {
            recipients,
            subject,
            source,
            ..
        } => {
            assert_eq!(recipients, "alice@example.com,Alice;bob@example.com,");
            assert_eq!(subject, "Quarterly report");
            match source {
                TransportError::Api { status, message } => {
                    assert_eq!(status, 401);
                    assert_eq!(message, "Invalid Credentials");
                }
                other => panic!("unexpected transport error: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_identity_never_reaches_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mailer = GmailMailer::from_config(&config(&server), Arc::new(MemoryStore::new())).unwrap();
    let err = mailer.send(&email(), Some("nobody")).await.unwrap_err();
    assert!(matches!(err, Error::ClientInitialization { .. }));
    assert!(err.requires_reauthorization());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/messages/send"))
        .and(header("authorization", "Bearer ya29.fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "18c2" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let expired = Token::new("ya29.stale", "Bearer")
        .with_expires_at(Utc::now() - Duration::minutes(5))
        .with_refresh_token("1//refresh");
    store_token(&store, "gmail-credentials", expired).await;
    let mailer = GmailMailer::from_config(&config(&server), store.clone()).unwrap();

    mailer.send(&email(), None).await.unwrap();

    let stored = store.load(&Identity::default()).await.unwrap();
    assert_eq!(stored.token.access_token, "ya29.fresh");
    assert_eq!(stored.token.refresh_token.as_deref(), Some("1//refresh"));
}

#[tokio::test]
async fn test_revoked_refresh_token_requires_reauthorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let expired = Token::new("ya29.stale", "Bearer")
        .with_expires_at(Utc::now() - Duration::minutes(5))
        .with_refresh_token("1//revoked");
    store_token(&store, "gmail-credentials", expired).await;
    let mailer = GmailMailer::from_config(&config(&server), store).unwrap();

    let err = mailer.send(&email(), None).await.unwrap_err();
    assert!(matches!(err, Error::ClientInitialization { .. }));
    assert!(err.is_unauthorized());
}
