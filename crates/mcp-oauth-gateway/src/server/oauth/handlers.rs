//! OAuth 2.0 endpoint handlers.
//!
//! Implements:
//! - RFC 6749: Authorization Code Grant (`client_secret_basic` and `client_secret_post`)
//! - RFC 7009: Token Revocation
//! - RFC 8414: OAuth Authorization Server Metadata
//! - A minimal userinfo endpoint

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::credentials::{OAuthForm, PresentedCredentials, parse_form};
use super::store::generate_token;
use super::types::{AccessToken, AuthorizationCode};
use crate::config::defaults;
use crate::error::OAuthError;
use crate::server::gate::authenticate_bearer;
use crate::server::transport::HttpState;

/// Subject reported by the userinfo endpoint.
pub const USERINFO_SUBJECT: &str = "mcp-server-user";

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

/// `GET /oauth/authorize`
///
/// Issues a code without a consent page: the configured client is trusted.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, OAuthError> {
    let config = &state.config;

    let client_id = query.client_id.as_deref().unwrap_or_default();
    if client_id.is_empty() || client_id != config.client_id {
        tracing::warn!(client_id = %client_id, "Authorization rejected: invalid_client");
        return Err(OAuthError::invalid_client_request());
    }
    if query.response_type.as_deref() != Some("code") {
        tracing::warn!(response_type = ?query.response_type, "Authorization rejected");
        return Err(OAuthError::UnsupportedResponseType);
    }
    let Some(redirect_uri) = query.redirect_uri.as_deref().filter(|uri| !uri.is_empty()) else {
        tracing::warn!("Authorization rejected: missing redirect_uri");
        return Err(OAuthError::invalid_request("redirect_uri is required"));
    };
    if let Some(ref allowed) = config.allowed_redirect_uri {
        if allowed != redirect_uri {
            tracing::warn!(redirect_uri = %redirect_uri, "Authorization rejected: redirect_uri not allowed");
            return Err(OAuthError::invalid_request("redirect_uri is not registered"));
        }
    }

    let code = generate_token();
    let location = redirect_location(redirect_uri, &code, query.state.as_deref());
    let Ok(location) = HeaderValue::try_from(location) else {
        tracing::warn!("Authorization rejected: redirect_uri is not a valid header value");
        return Err(OAuthError::invalid_request("redirect_uri is not a valid URI"));
    };

    let scope = query.scope.clone().unwrap_or_else(|| config.default_scope.clone());
    state
        .store
        .put_code(
            code,
            AuthorizationCode {
                client_id: client_id.to_owned(),
                redirect_uri: redirect_uri.to_owned(),
                scope,
                expires_at: state.clock.now() + config.code_lifetime(),
                used: false,
            },
        )
        .await;

    tracing::info!(client_id = %client_id, "Issued authorization code");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Append `code` (and `state`, when non-empty) to the client's redirect URI.
fn redirect_location(redirect_uri: &str, code: &str, oauth_state: Option<&str>) -> String {
    let mut location = redirect_uri.to_owned();
    location.push_str(if location.contains('?') { "&" } else { "?" });
    location.push_str("code=");
    location.push_str(code);
    if let Some(oauth_state) = oauth_state.filter(|s| !s.is_empty()) {
        location.push_str("&state=");
        location.extend(url::form_urlencoded::byte_serialize(oauth_state.as_bytes()));
    }
    location
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

/// `POST /oauth/token`
///
/// Exchange an authorization code for an access/refresh token pair.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OAuthError> {
    let config = &state.config;

    let form = parse_form(&headers, &body).map_err(|e| {
        tracing::warn!(error = %e, "Token request rejected: unreadable body");
        OAuthError::invalid_request("request body could not be decoded")
    })?;

    if form.grant_type.as_deref() != Some("authorization_code") {
        tracing::warn!(grant_type = ?form.grant_type, "Token request rejected");
        return Err(OAuthError::UnsupportedGrantType);
    }

    let credentials = PresentedCredentials::from_request(&headers, &form);
    if !credentials.authenticates(config) {
        tracing::warn!(basic = credentials.is_basic(), "Token request rejected: invalid_client");
        return Err(OAuthError::invalid_client_credentials());
    }

    let Some(code) = form.code.as_deref() else {
        tracing::warn!("Token request rejected: missing code");
        return Err(OAuthError::InvalidGrant);
    };

    let now = state.clock.now();
    let grant = state
        .store
        .consume_code(code, form.redirect_uri.as_deref(), now)
        .await
        .map_err(|failure| {
            tracing::warn!(reason = failure.as_str(), "Token request rejected: invalid_grant");
            OAuthError::InvalidGrant
        })?;

    let access_token = generate_token();
    let refresh_token = generate_token();
    state
        .store
        .put_token(
            access_token.clone(),
            AccessToken {
                client_id: grant.client_id.clone(),
                scope: grant.scope.clone(),
                expires_at: now + config.token_lifetime(),
                refresh_token: refresh_token.clone(),
            },
        )
        .await;

    tracing::info!(client_id = %grant.client_id, "Issued access token");

    let mut response = Json(serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": config.token_ttl.as_secs(),
        "refresh_token": refresh_token,
        "scope": grant.scope
    }))
    .into_response();

    // RFC 6749 §5.1
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(response)
}

// ─── UserInfo Endpoint ───────────────────────────────────────────────────────

/// `GET /oauth/userinfo`
pub async fn handle_userinfo(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Result<Response, OAuthError> {
    let token = authenticate_bearer(&state, &headers).await?;

    Ok(Json(serde_json::json!({
        "sub": USERINFO_SUBJECT,
        "name": "MCP Server",
        "scope": token.scope
    }))
    .into_response())
}

// ─── Revocation Endpoint ─────────────────────────────────────────────────────

/// `POST /oauth/revoke`
///
/// Always answers `{"revoked": true}` once the optional Basic credentials check
/// passes, whether or not the token existed.
pub async fn handle_revoke(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OAuthError> {
    let form = parse_form(&headers, &body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Revocation body unreadable, treating as empty");
        OAuthForm::default()
    });

    let credentials = PresentedCredentials::from_request(&headers, &form);
    if credentials.is_basic() && !credentials.authenticates(&state.config) {
        tracing::warn!("Revocation rejected: invalid_client");
        return Err(OAuthError::invalid_client_credentials());
    }

    if let Some(ref token) = form.token {
        let existed = state.store.delete_token(token).await;
        tracing::info!(
            existed,
            hint = form.token_type_hint.as_deref().unwrap_or("access_token"),
            "Processed token revocation"
        );
    }

    Ok(Json(serde_json::json!({ "revoked": true })).into_response())
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
pub async fn handle_auth_server_metadata(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let base_url = issuer_base_url(&state, &headers);

    Json(serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/oauth/authorize"),
        "token_endpoint": format!("{base_url}/oauth/token"),
        "userinfo_endpoint": format!("{base_url}/oauth/userinfo"),
        "revocation_endpoint": format!("{base_url}/oauth/revoke"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["client_secret_basic", "client_secret_post"],
        "scopes_supported": defaults::SUPPORTED_SCOPES
    }))
}

/// Configured public URL, else `http://<Host header>`, else the bind address.
fn issuer_base_url(state: &HttpState, headers: &HeaderMap) -> String {
    if let Some(ref base) = state.config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}:{}", state.config.host, state.config.port));
    format!("http://{host}")
}
