//! OAuth 2.0 authorization server embedded in the gateway.
//!
//! A single pre-configured confidential client obtains codes from
//! `/oauth/authorize` and exchanges them at `/oauth/token`. State lives in a
//! [`CredentialStore`] owned by the gateway.
//!
//! ## Supported Standards
//! - RFC 6749: Authorization Code Grant
//! - RFC 7009: Token Revocation
//! - RFC 8414: OAuth Authorization Server Metadata

pub mod credentials;
pub mod handlers;
pub mod store;
pub mod types;

pub use store::{CredentialStore, InMemoryCredentialStore};
pub use types::{AccessToken, AuthorizationCode};
