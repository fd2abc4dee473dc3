//! Error types for the MCP OAuth gateway.
//!
//! Two disjoint taxonomies: [`OAuthError`] terminates an HTTP exchange with a
//! status code, while [`ToolError`] is downgraded into a tool result with
//! `isError: true` by the dispatcher.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// OAuth 2.0 and access-gate failures.
///
/// None of the variants carry details about which credential was wrong.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthError {
    /// Unknown client id or mismatched client credentials.
    #[error("invalid_client")]
    InvalidClient {
        /// HTTP status to answer with (400 on authorize, 401 on token/revoke).
        status: StatusCode,
    },

    /// `response_type` other than `code`.
    #[error("unsupported_response_type")]
    UnsupportedResponseType,

    /// A required request parameter is missing or not acceptable.
    #[error("invalid_request: {description}")]
    InvalidRequest {
        /// Human readable reason sent as `error_description`.
        description: &'static str,
    },

    /// `grant_type` other than `authorization_code`.
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,

    /// Authorization code unknown, expired, used, or bound to another redirect URI.
    #[error("invalid_grant")]
    InvalidGrant,

    /// Bearer token is not known to the store.
    #[error("invalid_token")]
    InvalidToken,

    /// Bearer token was known but is past its expiry.
    #[error("token_expired")]
    TokenExpired,

    /// No `Authorization: Bearer` header on a protected request.
    #[error("missing_token")]
    MissingToken,
}

impl OAuthError {
    /// `invalid_client` as returned by the authorization endpoint.
    #[must_use]
    pub const fn invalid_client_request() -> Self {
        Self::InvalidClient { status: StatusCode::BAD_REQUEST }
    }

    /// `invalid_client` as returned by endpoints that authenticate the client.
    #[must_use]
    pub const fn invalid_client_credentials() -> Self {
        Self::InvalidClient { status: StatusCode::UNAUTHORIZED }
    }

    /// Create an `invalid_request` error.
    #[must_use]
    pub const fn invalid_request(description: &'static str) -> Self {
        Self::InvalidRequest { description }
    }

    /// The OAuth error code placed in the `error` field.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidClient { .. } => "invalid_client",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::MissingToken => "missing_token",
        }
    }

    /// HTTP status code for the error response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidClient { status } => *status,
            Self::UnsupportedResponseType
            | Self::InvalidRequest { .. }
            | Self::UnsupportedGrantType
            | Self::InvalidGrant => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::TokenExpired | Self::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    /// JSON body of the error response.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            Self::InvalidRequest { description } => serde_json::json!({
                "error": self.code(),
                "error_description": description
            }),
            _ => serde_json::json!({ "error": self.code() }),
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}

/// Errors raised by external collaborators reached through tools.
#[derive(thiserror::Error, Debug)]
pub enum CollaboratorError {
    /// Filesystem or transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested resource does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Collaborator cannot serve requests right now (e.g. index not built).
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from an external collaborator
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Arguments did not match the tool's input schema
    #[error("Invalid arguments: {0}")]
    Arguments(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Convert to the message shown to the calling client in the tool result.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::Collaborator(CollaboratorError::NotFound { resource }) => {
                format!("Not found: {resource}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Result type alias for collaborator operations.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
