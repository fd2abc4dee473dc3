//! OAuth 2.0 credential records.

use chrono::{DateTime, Utc};

/// An authorization code issued by the authorize endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl AuthorizationCode {
    /// Check if the code has expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A used or expired code is indistinguishable from an unknown one.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired(now)
    }
}

/// An access token for the protected endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub client_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
    /// Issued alongside the access token; never redeemable.
    pub refresh_token: String,
}

impl AccessToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Why a code could not be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemFailure {
    /// Unknown code.
    NotFound,
    /// Past its expiry.
    Expired,
    /// Already exchanged once.
    Used,
    /// Presented with a different redirect URI than at issuance.
    RedirectMismatch,
}

impl RedeemFailure {
    /// Short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Used => "used",
            Self::RedirectMismatch => "redirect_mismatch",
        }
    }
}

/// Counts returned by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub codes_removed: usize,
    pub tokens_removed: usize,
}
