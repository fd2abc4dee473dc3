//! Bearer-token gate in front of every protected route.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::oauth::credentials::bearer_token;
use super::oauth::types::AccessToken;
use super::transport::HttpState;
use crate::error::OAuthError;

/// `Access-Control-Allow-Origin` on protected responses.
pub const ALLOW_ORIGIN: &str = "*";
/// `Access-Control-Allow-Methods` on protected responses.
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// `Access-Control-Allow-Headers` on protected responses, including the MCP session header.
pub const ALLOW_HEADERS: &str = "Content-Type, Accept, Authorization, mcp-session-id";

/// Validate the `Authorization: Bearer` header of a request.
///
/// An expired token is removed from the store before `token_expired` is
/// returned, so later presentations of it fail with `invalid_token`.
pub async fn authenticate_bearer(
    state: &HttpState,
    headers: &HeaderMap,
) -> Result<AccessToken, OAuthError> {
    let Some(token) = bearer_token(headers) else {
        return Err(OAuthError::MissingToken);
    };

    let Some(record) = state.store.get_token(token).await else {
        return Err(OAuthError::InvalidToken);
    };

    if record.is_expired(state.clock.now()) {
        state.store.delete_token(token).await;
        return Err(OAuthError::TokenExpired);
    }

    Ok(record)
}

/// Middleware: reject requests without a live bearer token.
///
/// CORS headers are added by layers inside this one, so rejections carry none.
pub async fn access_gate(
    State(state): State<Arc<HttpState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = authenticate_bearer(&state, request.headers()).await {
        tracing::warn!(
            error = e.code(),
            path = %request.uri().path(),
            "Rejected protected request"
        );
        return e.into_response();
    }

    next.run(request).await
}
