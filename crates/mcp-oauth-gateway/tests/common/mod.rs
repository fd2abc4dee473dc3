//! Shared fixtures for HTTP-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{TimeZone, Utc};
use tower::ServiceExt;

use mcp_oauth_gateway::clock::ManualClock;
use mcp_oauth_gateway::config::Config;
use mcp_oauth_gateway::corpus::DocumentIndex;
use mcp_oauth_gateway::server::Gateway;
use mcp_oauth_gateway::server::oauth::InMemoryCredentialStore;
use mcp_oauth_gateway::tools::register_all_tools;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "https://client.example.com/cb";

/// A gateway router with a controllable clock.
pub struct TestGateway {
    pub router: axum::Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryCredentialStore>,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::with_config(Config::for_testing(), None)
    }

    pub fn with_config(config: Config, index: Option<Arc<dyn DocumentIndex>>) -> Self {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()));
        let store = Arc::new(InMemoryCredentialStore::new());
        let gateway = Gateway::with_store_and_clock(
            config,
            register_all_tools(index).unwrap(),
            store.clone(),
            clock.clone(),
        );
        Self { router: gateway.router(), clock, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Run `/oauth/authorize` and return the issued code.
    pub async fn authorize(&self) -> String {
        let response = self.send(authorize_request(CLIENT_ID, REDIRECT_URI, "code", Some("xyz"))).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        query_param(&location(&response), "code").unwrap()
    }

    /// Exchange `code` with `client_secret_post` credentials.
    pub async fn exchange(&self, code: &str) -> Response<Body> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("client_id", CLIENT_ID),
            ("client_secret", CLIENT_SECRET),
        ];
        self.send(form_post("/oauth/token", &form, None)).await
    }

    /// Complete the authorization-code flow and return the access token.
    pub async fn access_token(&self) -> String {
        let code = self.authorize().await;
        let response = self.exchange(&code).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["access_token"].as_str().unwrap().to_string()
    }

    /// POST a JSON-RPC message to `/mcp` with a bearer token.
    pub async fn rpc(&self, token: &str, message: serde_json::Value) -> serde_json::Value {
        let response = self.send(mcp_post(Some(token), &message.to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }
}

pub fn authorize_request(
    client_id: &str,
    redirect_uri: &str,
    response_type: &str,
    state: Option<&str>,
) -> Request<Body> {
    let mut params = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", response_type),
    ];
    if let Some(state) = state {
        params.push(("state", state));
    }
    let query = serde_urlencoded::to_string(&params).unwrap();
    Request::get(format!("/oauth/authorize?{query}")).body(Body::empty()).unwrap()
}

pub fn form_post(path: &str, form: &[(&str, &str)], basic: Option<(&str, &str)>) -> Request<Body> {
    let mut builder =
        Request::post(path).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some((id, secret)) = basic {
        builder = builder.header(header::AUTHORIZATION, basic_header(id, secret));
    }
    builder.body(Body::from(serde_urlencoded::to_string(form).unwrap())).unwrap()
}

pub fn basic_header(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

pub fn mcp_post(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post("/mcp").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

pub fn query_param(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location).unwrap();
    url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
