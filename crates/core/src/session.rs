//! # Session Module
//!
//! Session rows, the claims carried inside a signed token, and the identity
//! handed back to callers once a token has been authenticated.

use crate::account::Role;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifetime used when the caller does not specify one (1 hour)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Longest lifetime a session may be issued with (30 days)
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Resolve a requested TTL, falling back to `default_secs` when unset.
pub fn session_ttl(requested: Option<u64>, default_secs: u64) -> CoreResult<Duration> {
    let secs = requested.unwrap_or(default_secs);
    if secs == 0 || secs > MAX_SESSION_TTL_SECS {
        return Err(CoreError::InvalidTtl(secs));
    }
    // Bounded above, so the cast cannot wrap
    Ok(Duration::seconds(secs as i64))
}

/// A persisted login session.
///
/// At most one live row exists per account: issuing a new session deletes
/// every earlier row for the same account first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(account_id: &str, token: &str, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            token: token.to_string(),
            expires_at,
            created_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Claims signed into every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username of the account holder
    pub sub: String,
    /// Account id
    pub uid: String,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    /// Unique token id; two logins in the same second still differ
    pub jti: String,
}

impl TokenClaims {
    pub fn new(account_id: &str, username: &str, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: username.to_string(),
            uid: account_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

/// Authenticated caller identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: String,
    pub username: String,
    pub role: Role,
}

impl From<&TokenClaims> for Identity {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            account_id: claims.uid.clone(),
            username: claims.sub.clone(),
            role: claims.role,
        }
    }
}

/// Token handed to the transport layer after login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
