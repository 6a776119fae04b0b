use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::TimeDelta;
use http::{HeaderMap, StatusCode, Uri};
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};

use crate::cache::token::Token;
use crate::config::token::{TokenKind, TokenSettings};
use crate::error::{TokenError, TokenRequestError};
use crate::helpers::time::FixedClock;
use crate::sources::{MagentoTokenRequest, TokenRequest, TokenRequestParams};
use crate::tests::common::{spawn_axum, utc};

const ADMIN_PATH: &str = "/index.php/rest/V1/integration/admin/token";
const CUSTOMER_PATH: &str = "/index.php/rest/V1/integration/customer/token";

#[derive(Debug, Clone)]
struct CapturedRequest {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<CapturedRequest>>>);

impl Captured {
    fn take(&self) -> Vec<CapturedRequest> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

async fn issue_token(
    State(captured): State<Captured>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<&'static str> {
    captured.0.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_owned(),
        headers,
        body,
    });
    Json("issued-token")
}

async fn spawn_shop() -> (Captured, String) {
    let captured = Captured::default();
    let router = Router::new()
        .route(ADMIN_PATH, post(issue_token))
        .route(CUSTOMER_PATH, post(issue_token))
        .with_state(captured.clone());
    let (_handle, addr) = spawn_axum(router).await;
    (captured, format!("http://{addr}"))
}

fn params<'a>(kind: TokenKind, endpoint: &'a str) -> TokenRequestParams<'a> {
    TokenRequestParams {
        kind,
        endpoint,
        user_agent: None,
        username: "admin",
        password: "1234567",
        http_auth_user: None,
        http_auth_password: None,
    }
}

#[test]
fn token_url_follows_rest_layout() {
    assert_eq!(
        MagentoTokenRequest::token_url(TokenKind::Admin, "https://shop.example.com").unwrap(),
        "https://shop.example.com/index.php/rest/V1/integration/admin/token"
    );
    assert_eq!(
        MagentoTokenRequest::token_url(TokenKind::Customer, "https://shop.example.com/").unwrap(),
        "https://shop.example.com/index.php/rest/V1/integration/customer/token"
    );
    assert!(matches!(
        MagentoTokenRequest::token_url(TokenKind::Static, "https://shop.example.com"),
        Err(TokenRequestError::UnsupportedKind(TokenKind::Static))
    ));
    assert!(matches!(
        MagentoTokenRequest::token_url(TokenKind::Admin, " "),
        Err(TokenRequestError::MissingArgument("endpoint address"))
    ));
}

#[tokio::test]
async fn posts_credentials_as_json() {
    let (captured, endpoint) = spawn_shop().await;
    let request = MagentoTokenRequest::new(Client::new());

    let token = request
        .request_token(&params(TokenKind::Admin, &endpoint))
        .await
        .unwrap();
    assert_eq!(token, "issued-token");

    let calls = captured.take();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.path, ADMIN_PATH);
    assert_eq!(call.body, json!({ "username": "admin", "password": "1234567" }));
    assert_eq!(call.headers["accept"], "application/json");
    assert!(call.headers.get("authorization").is_none());
}

#[tokio::test]
async fn sends_user_agent_and_basic_auth_when_set() {
    let (captured, endpoint) = spawn_shop().await;
    let request = MagentoTokenRequest::new(Client::new());
    let endpoint = format!("{endpoint}/");

    let params = TokenRequestParams {
        user_agent: Some("shop-sync/2.0"),
        http_auth_user: Some("httpauthuser"),
        http_auth_password: Some("httpauthpass"),
        ..params(TokenKind::Customer, &endpoint)
    };
    request.request_token(&params).await.unwrap();

    let calls = captured.take();
    assert_eq!(calls[0].path, CUSTOMER_PATH);
    assert_eq!(calls[0].headers["user-agent"], "shop-sync/2.0");
    assert_eq!(
        calls[0].headers["authorization"],
        "Basic aHR0cGF1dGh1c2VyOmh0dHBhdXRocGFzcw=="
    );
}

#[tokio::test]
async fn basic_auth_needs_both_halves() {
    let (captured, endpoint) = spawn_shop().await;
    let request = MagentoTokenRequest::new(Client::new());

    let params = TokenRequestParams {
        user_agent: Some("  "),
        http_auth_user: Some("httpauthuser"),
        http_auth_password: Some(""),
        ..params(TokenKind::Admin, &endpoint)
    };
    request.request_token(&params).await.unwrap();

    let calls = captured.take();
    assert!(calls[0].headers.get("authorization").is_none());
    assert!(calls[0].headers.get("user-agent").is_none());
}

#[tokio::test]
async fn rejected_request_carries_status_and_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(ADMIN_PATH);
            then.status(StatusCode::UNAUTHORIZED.as_u16())
                .header("Content-Type", "application/json")
                .json_body(json!({ "message": "The account sign-in was incorrect." }));
        })
        .await;

    let request = MagentoTokenRequest::new(Client::new());
    let err = request
        .request_token(&params(TokenKind::Admin, &server.base_url()))
        .await
        .unwrap_err();

    mock.assert_async().await;
    match &err {
        TokenRequestError::Rejected { status, reason, message } => {
            assert_eq!(*status, 401);
            assert_eq!(reason, "Unauthorized");
            assert_eq!(message.as_deref(), Some("The account sign-in was incorrect."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Error: Unauthorized (401). The account sign-in was incorrect."
    );
}

#[tokio::test]
async fn rejected_request_without_json_body_has_no_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ADMIN_PATH);
            then.status(503).body("<html>maintenance</html>");
        })
        .await;

    let request = MagentoTokenRequest::new(Client::new());
    let err = request
        .request_token(&params(TokenKind::Admin, &server.base_url()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TokenRequestError::Rejected { status: 503, message: None, .. }
    ));
    assert_eq!(err.to_string(), "Error: Service Unavailable (503).");
}

#[tokio::test]
async fn malformed_and_empty_tokens_are_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ADMIN_PATH);
            then.status(200).body("not json");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CUSTOMER_PATH);
            then.status(200).json_body(json!(""));
        })
        .await;

    let request = MagentoTokenRequest::new(Client::new());
    let base = server.base_url();

    assert!(matches!(
        request.request_token(&params(TokenKind::Admin, &base)).await,
        Err(TokenRequestError::Decode(_))
    ));
    assert!(matches!(
        request.request_token(&params(TokenKind::Customer, &base)).await,
        Err(TokenRequestError::EmptyToken)
    ));
}

#[tokio::test]
async fn invalid_arguments_fail_before_sending() {
    let request = MagentoTokenRequest::new(Client::new());

    let err = request
        .request_token(&params(TokenKind::Static, "http://127.0.0.1:9"))
        .await
        .unwrap_err();
    assert!(matches!(err, TokenRequestError::UnsupportedKind(TokenKind::Static)));
    assert!(err.to_string().contains("not supported"));

    let blank_password = TokenRequestParams {
        password: "",
        ..params(TokenKind::Admin, "http://127.0.0.1:9")
    };
    assert!(matches!(
        request.request_token(&blank_password).await,
        Err(TokenRequestError::MissingArgument("password"))
    ));

    let blank_user = TokenRequestParams {
        username: " ",
        ..params(TokenKind::Admin, "http://127.0.0.1:9")
    };
    assert!(matches!(
        request.request_token(&blank_user).await,
        Err(TokenRequestError::MissingArgument("user"))
    ));
}

#[tokio::test]
async fn token_renews_against_shop_only_after_expiry() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(ADMIN_PATH)
                .json_body(json!({ "username": "admin", "password": "1234567" }));
            then.status(200).json_body(json!("first-token"));
        })
        .await;

    let clock = FixedClock::new(utc("2019-02-01T20:11:00Z"));
    let mut token = Token::new(MagentoTokenRequest::new(Client::new()), clock.clone());
    token
        .configure(&TokenSettings::credentials(
            TokenKind::Admin,
            server.base_url(),
            "admin",
            "1234567",
        ))
        .unwrap();

    assert_eq!(token.create_or_reuse().await.unwrap(), "first-token");
    assert_eq!(token.create_or_reuse().await.unwrap(), "first-token");
    first.assert_async().await;
    assert_eq!(token.expires().unwrap(), Some(utc("2019-02-02T00:11:00Z")));

    first.delete_async().await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST).path(ADMIN_PATH);
            then.status(200).json_body(json!("second-token"));
        })
        .await;

    clock.advance(TimeDelta::hours(4));
    assert!(!token.is_valid().unwrap());
    assert_eq!(token.create_or_reuse().await.unwrap(), "second-token");
    second.assert_async().await;
    assert_eq!(token.expires().unwrap(), Some(utc("2019-02-02T04:11:00Z")));
}

#[tokio::test]
async fn shop_rejection_surfaces_through_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CUSTOMER_PATH);
            then.status(401).json_body(json!({ "message": "Invalid login" }));
        })
        .await;

    let mut token = Token::new(
        MagentoTokenRequest::new(Client::new()),
        FixedClock::new(utc("2019-02-01T20:11:00Z")),
    );
    token
        .configure(&TokenSettings::credentials(
            TokenKind::Customer,
            server.base_url(),
            "jane",
            "wrong",
        ))
        .unwrap();

    let err = token.create_or_reuse().await.unwrap_err();
    assert!(matches!(
        err,
        TokenError::RequestFailed(TokenRequestError::Rejected { status: 401, .. })
    ));
    assert_eq!(token.expires().unwrap(), None);
}
