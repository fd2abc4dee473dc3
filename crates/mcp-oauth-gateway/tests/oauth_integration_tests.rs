//! End-to-end tests for the embedded authorization server, driven through the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use serde_json::json;

use common::*;
use mcp_oauth_gateway::config::Config;

#[tokio::test]
async fn test_authorize_redirects_with_code_and_state() {
    let gw = TestGateway::new();

    let response = gw.send(authorize_request(CLIENT_ID, REDIRECT_URI, "code", Some("xyz"))).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = location(&response);
    assert!(location.starts_with("https://client.example.com/cb?code="));
    assert_eq!(query_param(&location, "state").as_deref(), Some("xyz"));

    let code = query_param(&location, "code").unwrap();
    assert_eq!(code.len(), 64);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(gw.store.code_count().await, 1);
}

#[tokio::test]
async fn test_authorize_omits_empty_state() {
    let gw = TestGateway::new();
    let response = gw.send(authorize_request(CLIENT_ID, REDIRECT_URI, "code", Some(""))).await;
    assert_eq!(query_param(&location(&response), "state"), None);
}

#[tokio::test]
async fn test_authorize_rejections_in_order() {
    let gw = TestGateway::new();

    // Wrong client wins over a wrong response type.
    let response = gw.send(authorize_request("intruder", REDIRECT_URI, "token", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "invalid_client"}));

    let response = gw.send(authorize_request(CLIENT_ID, REDIRECT_URI, "token", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "unsupported_response_type");

    let response = gw.send(authorize_request(CLIENT_ID, "", "code", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_request");

    assert_eq!(gw.store.code_count().await, 0);
}

#[tokio::test]
async fn test_authorize_rejects_redirect_uri_unusable_as_location() {
    let gw = TestGateway::new();

    let response = gw.send(authorize_request(CLIENT_ID, "https://cb/\nx", "code", Some("xyz"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(gw.store.code_count().await, 0);
}

#[tokio::test]
async fn test_authorize_enforces_pinned_redirect_uri() {
    let mut config = Config::for_testing();
    config.allowed_redirect_uri = Some(REDIRECT_URI.to_string());
    let gw = TestGateway::with_config(config, None);

    let response = gw.send(authorize_request(CLIENT_ID, "https://evil.example.com/cb", "code", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["error_description"].is_string());

    let response = gw.send(authorize_request(CLIENT_ID, REDIRECT_URI, "code", None)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_full_flow_issues_bearer_token() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    let response = gw.exchange(&code).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = json_body(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["scope"], "mcp:read mcp:write");
    let access = body["access_token"].as_str().unwrap();
    let refresh = body["refresh_token"].as_str().unwrap();
    assert_eq!(access.len(), 64);
    assert_ne!(access, refresh);

    let response = gw
        .send(
            Request::get("/oauth/userinfo")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"sub": "mcp-server-user", "name": "MCP Server", "scope": "mcp:read mcp:write"})
    );
}

#[tokio::test]
async fn test_code_is_single_use() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    assert_eq!(gw.exchange(&code).await.status(), StatusCode::OK);

    let response = gw.exchange(&code).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "invalid_grant"}));
}

#[tokio::test]
async fn test_code_expires_after_ten_minutes() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    gw.clock.advance(Duration::seconds(601));

    let response = gw.exchange(&code).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn test_code_still_valid_at_expiry_instant() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    gw.clock.advance(Duration::seconds(600));
    assert_eq!(gw.exchange(&code).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_redirect_mismatch_does_not_burn_code() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", "https://other.example.com/cb"),
        ("client_id", CLIENT_ID),
        ("client_secret", CLIENT_SECRET),
    ];
    let response = gw.send(form_post("/oauth/token", &form, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_grant");

    assert_eq!(gw.exchange(&code).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_accepts_basic_credentials() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ];
    let response = gw.send(form_post("/oauth/token", &form, Some((CLIENT_ID, CLIENT_SECRET)))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_basic_credentials_take_precedence_over_body() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", CLIENT_ID),
        ("client_secret", CLIENT_SECRET),
    ];
    let response = gw.send(form_post("/oauth/token", &form, Some((CLIENT_ID, "wrong")))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({"error": "invalid_client"}));
}

#[tokio::test]
async fn test_token_accepts_json_body() {
    let gw = TestGateway::new();
    let code = gw.authorize().await;

    let body = json!({
        "grant_type": "authorization_code",
        "code": code,
        "redirect_uri": REDIRECT_URI,
        "client_id": CLIENT_ID,
        "client_secret": CLIENT_SECRET
    });
    let response = gw
        .send(
            Request::post("/oauth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_rejections_in_order() {
    let gw = TestGateway::new();

    // Unsupported grant is reported before bad credentials.
    let form = [("grant_type", "password"), ("client_id", CLIENT_ID), ("client_secret", "nope")];
    let response = gw.send(form_post("/oauth/token", &form, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "unsupported_grant_type");

    // Bad credentials are reported before an unknown code.
    let form = [
        ("grant_type", "authorization_code"),
        ("code", "unknown"),
        ("client_id", CLIENT_ID),
        ("client_secret", "nope"),
    ];
    let response = gw.send(form_post("/oauth/token", &form, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "invalid_client");

    let form = [
        ("grant_type", "authorization_code"),
        ("code", "unknown"),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", CLIENT_ID),
        ("client_secret", CLIENT_SECRET),
    ];
    let response = gw.send(form_post("/oauth/token", &form, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn test_revoke_unknown_token_succeeds() {
    let gw = TestGateway::new();
    let response = gw.send(form_post("/oauth/revoke", &[("token", "never-issued")], None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"revoked": true}));
}

#[tokio::test]
async fn test_revoke_invalidates_access_token() {
    let gw = TestGateway::new();
    let token = gw.access_token().await;

    let response = gw
        .send(form_post("/oauth/revoke", &[("token", token.as_str())], Some((CLIENT_ID, CLIENT_SECRET))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gw.store.token_count().await, 0);

    let response = gw.send(mcp_post(Some(&token), r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_revoke_with_wrong_basic_credentials() {
    let gw = TestGateway::new();
    let token = gw.access_token().await;

    let response = gw
        .send(form_post("/oauth/revoke", &[("token", token.as_str())], Some((CLIENT_ID, "wrong"))))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "invalid_client");
    assert_eq!(gw.store.token_count().await, 1);
}

#[tokio::test]
async fn test_userinfo_requires_token() {
    let gw = TestGateway::new();
    let response = gw.send(Request::get("/oauth/userinfo").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "missing_token");
}

#[tokio::test]
async fn test_userinfo_expired_token_is_deleted() {
    let gw = TestGateway::new();
    let token = gw.access_token().await;
    let userinfo = || {
        Request::get("/oauth/userinfo")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    gw.clock.advance(Duration::seconds(3601));

    let response = gw.send(userinfo()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({"error": "token_expired"}));
    assert_eq!(gw.store.token_count().await, 0);

    let response = gw.send(userinfo()).await;
    assert_eq!(json_body(response).await, json!({"error": "invalid_token"}));
}

#[tokio::test]
async fn test_discovery_document_uses_host_header() {
    let gw = TestGateway::new();
    let response = gw
        .send(
            Request::get("/.well-known/oauth-authorization-server")
                .header(header::HOST, "gateway.local:8001")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["issuer"], "http://gateway.local:8001");
    assert_eq!(body["token_endpoint"], "http://gateway.local:8001/oauth/token");
    assert_eq!(body["response_types_supported"], json!(["code"]));
    assert_eq!(body["grant_types_supported"], json!(["authorization_code"]));
    assert_eq!(
        body["token_endpoint_auth_methods_supported"],
        json!(["client_secret_basic", "client_secret_post"])
    );
}

#[tokio::test]
async fn test_discovery_document_prefers_configured_base_url() {
    let mut config = Config::for_testing();
    config.public_base_url = Some("https://mcp.example.com/".to_string());
    let gw = TestGateway::with_config(config, None);

    let response = gw
        .send(Request::get("/.well-known/oauth-authorization-server").body(Body::empty()).unwrap())
        .await;
    let body = json_body(response).await;
    assert_eq!(body["issuer"], "https://mcp.example.com");
    assert_eq!(body["revocation_endpoint"], "https://mcp.example.com/oauth/revoke");
}
