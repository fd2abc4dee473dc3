//! Client credential and request body decoding for the token and revoke endpoints.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::config::Config;

/// Client id and secret as presented by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Fields accepted by `/oauth/token` and `/oauth/revoke`.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token: Option<String>,
    pub token_type_hint: Option<String>,
}

/// Where the client credentials came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedCredentials {
    /// `Authorization: Basic` header that decoded cleanly.
    Basic(ClientCredentials),
    /// `Authorization: Basic` header that did not decode.
    MalformedBasic,
    /// `client_id`/`client_secret` body fields (either may be missing).
    Body { client_id: Option<String>, client_secret: Option<String> },
}

impl PresentedCredentials {
    /// Pick the credentials of a request. Basic takes precedence over body fields.
    #[must_use]
    pub fn from_request(headers: &HeaderMap, form: &OAuthForm) -> Self {
        match basic_header(headers) {
            Some(encoded) => {
                decode_basic(encoded).map_or(Self::MalformedBasic, Self::Basic)
            }
            None => Self::Body {
                client_id: form.client_id.clone(),
                client_secret: form.client_secret.clone(),
            },
        }
    }

    /// The `(client_id, client_secret)` pair, when one was presented in full.
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self {
            Self::Basic(creds) => Some((&creds.client_id, &creds.client_secret)),
            Self::Body { client_id: Some(id), client_secret: Some(secret) } => Some((id, secret)),
            Self::MalformedBasic | Self::Body { .. } => None,
        }
    }

    /// Whether the credentials name the configured client.
    #[must_use]
    pub fn authenticates(&self, config: &Config) -> bool {
        self.pair().is_some_and(|(id, secret)| config.client_matches(id, secret))
    }

    /// Whether an `Authorization: Basic` header was present at all.
    #[must_use]
    pub const fn is_basic(&self) -> bool {
        matches!(self, Self::Basic(_) | Self::MalformedBasic)
    }
}

fn basic_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
}

/// Decode the payload of a Basic header into `client_id:client_secret`.
#[must_use]
pub fn decode_basic(encoded: &str) -> Option<ClientCredentials> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    Some(ClientCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}

/// Extract the token of an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Body could not be decoded in the encoding its `Content-Type` announced.
#[derive(thiserror::Error, Debug)]
pub enum BodyError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

/// Decode a JSON body when `Content-Type` says so, form-urlencoded otherwise.
pub fn parse_form(headers: &HeaderMap, body: &[u8]) -> Result<OAuthForm, BodyError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        Ok(serde_json::from_slice(body)?)
    } else {
        Ok(serde_urlencoded::from_bytes(body)?)
    }
}
