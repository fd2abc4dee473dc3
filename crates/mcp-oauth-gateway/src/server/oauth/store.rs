//! Credential store for authorization codes and access tokens.
//!
//! Each map sits behind its own lock. Nothing in here performs I/O, so callers
//! never hold a lock across a tool invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::{AccessToken, AuthorizationCode, RedeemFailure, SweepReport};
use crate::clock::Clock;

/// Generate an opaque, URL-safe credential from two UUIDs (244 random bits).
#[must_use]
pub fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// Storage for pending authorization codes and active access tokens.
///
/// Implementations must make [`CredentialStore::consume_code`] atomic: two
/// concurrent exchanges of the same code may not both succeed.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a code under its own value.
    async fn put_code(&self, code: String, grant: AuthorizationCode);

    /// Look up a code without consuming it.
    async fn get_code(&self, code: &str) -> Option<AuthorizationCode>;

    /// Redeem a code: it must exist, be unexpired, unused, and bound to
    /// `redirect_uri`. On success the code is marked used and returned.
    async fn consume_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationCode, RedeemFailure>;

    /// Store an access token under its own value.
    async fn put_token(&self, token: String, record: AccessToken);

    /// Look up an access token.
    async fn get_token(&self, token: &str) -> Option<AccessToken>;

    /// Remove an access token. Returns whether it existed.
    async fn delete_token(&self, token: &str) -> bool;

    /// Drop expired or used codes and expired tokens.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> SweepReport;
}

/// In-memory credential store. Lifetime is the process lifetime.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    codes: Arc<RwLock<HashMap<String, AuthorizationCode>>>,
    tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes, including used ones.
    pub async fn code_count(&self) -> usize {
        self.codes.read().await.len()
    }

    /// Number of stored access tokens.
    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore").finish()
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn put_code(&self, code: String, grant: AuthorizationCode) {
        self.codes.write().await.insert(code, grant);
    }

    async fn get_code(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.read().await.get(code).cloned()
    }

    async fn consume_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationCode, RedeemFailure> {
        let mut codes = self.codes.write().await;
        let grant = codes.get_mut(code).ok_or(RedeemFailure::NotFound)?;

        if grant.is_expired(now) {
            return Err(RedeemFailure::Expired);
        }
        if grant.used {
            return Err(RedeemFailure::Used);
        }
        if redirect_uri != Some(grant.redirect_uri.as_str()) {
            return Err(RedeemFailure::RedirectMismatch);
        }

        grant.used = true;
        Ok(grant.clone())
    }

    async fn put_token(&self, token: String, record: AccessToken) {
        self.tokens.write().await.insert(token, record);
    }

    async fn get_token(&self, token: &str) -> Option<AccessToken> {
        self.tokens.read().await.get(token).cloned()
    }

    async fn delete_token(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> SweepReport {
        let codes_removed = {
            let mut codes = self.codes.write().await;
            let before = codes.len();
            codes.retain(|_, code| code.is_redeemable(now));
            before - codes.len()
        };

        let tokens_removed = {
            let mut tokens = self.tokens.write().await;
            let before = tokens.len();
            tokens.retain(|_, token| !token.is_expired(now));
            before - tokens.len()
        };

        SweepReport { codes_removed, tokens_removed }
    }
}

/// Start a background task sweeping `store` every `interval`.
pub fn start_sweep_task(
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = store.sweep_expired(clock.now()).await;
            if report != SweepReport::default() {
                tracing::debug!(
                    codes = report.codes_removed,
                    tokens = report.tokens_removed,
                    "Swept expired credentials"
                );
            }
        }
    })
}
