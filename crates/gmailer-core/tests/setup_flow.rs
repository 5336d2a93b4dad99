//! Setup flow against a mock token endpoint.
//!
//! Covers the consent redirect, the code exchange (including the exact
//! redirect URI Google requires), identity normalization and the admin
//! callback outcomes.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use gmailer_core::admin::SETUP_COMPLETE;
use gmailer_core::{
    AdminController, AdminResponse, CredentialStore, DEFAULT_IDENTITY, Error, GmailConfig,
    Identity, MemoryStore, SetupFlow,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const HOST: &str = "https://app.example.com";
const CALLBACK: &str = "https://app.example.com/admin/gmail/oauth2callback";

fn config(server: &MockServer) -> GmailConfig {
    GmailConfig::new(HOST, "client-id", "client-secret")
        .with_token_url(format!("{}/token", server.uri()))
}

fn token_body() -> serde_json::Value {
    json!({
        "access_token": "ya29.access",
        "token_type": "Bearer",
        "expires_in": 3599,
        "refresh_token": "1//refresh",
        "scope": "https://www.googleapis.com/auth/gmail.compose"
    })
}

/// Matches a token request whose form `redirect_uri` equals `expected`.
fn redirect_uri_is(expected: String) -> impl Fn(&Request) -> bool {
    move |request: &Request| {
        url::form_urlencoded::parse(&request.body)
            .any(|(k, v)| k == "redirect_uri" && v == expected.as_str())
    }
}

async fn mount_token(server: &MockServer, redirect_uri: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2Fcode"))
        .and(body_string_contains("client_secret=client-secret"))
        .and(redirect_uri_is(redirect_uri.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_callback_without_identity_uses_default() {
    let server = MockServer::start().await;
    mount_token(&server, CALLBACK).await;

    let store = Arc::new(MemoryStore::new());
    let flow = SetupFlow::new(&config(&server), store.clone()).unwrap();

    let identity = flow.handle_callback("4/code", None).await.unwrap();
    assert_eq!(identity.as_str(), DEFAULT_IDENTITY);

    let credential = store.load(&Identity::default()).await.unwrap();
    assert_eq!(credential.token.access_token, "ya29.access");
    assert_eq!(credential.token.refresh_token.as_deref(), Some("1//refresh"));
    assert!(credential.token.expires_at.is_some());
    assert!(!credential.token.is_expired());
}

#[tokio::test]
async fn test_callback_lowercases_identity_but_keeps_redirect_verbatim() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        &format!("{CALLBACK}?credentialId=Monash.Inbox@Example.com"),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let flow = SetupFlow::new(&config(&server), store.clone()).unwrap();

    let identity = flow
        .handle_callback("4/code", Some("Monash.Inbox@Example.com"))
        .await
        .unwrap();
    assert_eq!(identity.as_str(), "monash.inbox@example.com");

    let stored: Vec<String> = store
        .identities()
        .await
        .iter()
        .map(|i| i.as_str().to_string())
        .collect();
    assert_eq!(stored, vec!["monash.inbox@example.com"]);
}

#[tokio::test]
async fn test_second_authorization_replaces_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.second",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let flow = SetupFlow::new(&config(&server), store.clone()).unwrap();

    flow.handle_callback("first", Some("sales")).await.unwrap();
    flow.handle_callback("second", Some("SALES")).await.unwrap();

    let credential = store.load(&Identity::resolve(Some("sales"))).await.unwrap();
    assert_eq!(credential.token.access_token, "ya29.second");
    assert_eq!(store.identities().await.len(), 1);
}

#[tokio::test]
async fn test_rejected_code_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let flow = SetupFlow::new(&config(&server), store.clone()).unwrap();

    let err = flow.handle_callback("used", Some("sales")).await.unwrap_err();
    match &err {
        Error::OAuthExchange { identity, source } => {
            assert_eq!(identity.as_str(), "sales");
            assert_eq!(source.oauth_code(), Some("invalid_grant"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.requires_reauthorization());
    assert!(store.identities().await.is_empty());
}

#[tokio::test]
async fn test_invalid_config_builds_no_flow() {
    let config = GmailConfig::new("", "client-id", "client-secret");
    let err = SetupFlow::new(&config, Arc::new(MemoryStore::new())).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn test_admin_setup_redirects_to_consent() {
    let server = MockServer::start().await;
    let flow = SetupFlow::new(&config(&server), Arc::new(MemoryStore::new())).unwrap();
    let admin = AdminController::new(Arc::new(flow));

    let AdminResponse::Redirect(url) = admin.setup(Some("law")) else {
        panic!("setup must redirect");
    };
    assert_eq!(url.host_str(), Some("accounts.google.com"));
    let redirect_uri = url
        .query_pairs()
        .find(|(k, _)| k == "redirect_uri")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(redirect_uri, format!("{CALLBACK}?credentialId=law"));
}

#[tokio::test]
async fn test_admin_callback_completes_setup() {
    let server = MockServer::start().await;
    mount_token(&server, &format!("{CALLBACK}?credentialId=law")).await;

    let store = Arc::new(MemoryStore::new());
    let flow = SetupFlow::new(&config(&server), store.clone()).unwrap();
    let admin = AdminController::new(Arc::new(flow));

    let response = admin.oauth_callback("4/code", Some("law")).await.unwrap();
    assert_eq!(response, AdminResponse::Text(SETUP_COMPLETE.to_string()));
    assert!(store.load(&Identity::resolve(Some("law"))).await.is_ok());
}

#[tokio::test]
async fn test_admin_callback_failure_restarts_consent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Code was already redeemed."
        })))
        .mount(&server)
        .await;

    let flow = Arc::new(SetupFlow::new(&config(&server), Arc::new(MemoryStore::new())).unwrap());
    let admin = AdminController::new(Arc::clone(&flow));

    let response = admin.oauth_callback("used", Some("law")).await.unwrap();
    assert_eq!(
        response,
        AdminResponse::Redirect(flow.authorization_url(Some("law")))
    );
}
