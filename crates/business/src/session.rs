//! Session Authority - issue, authenticate, revoke and sweep sessions.
//!
//! Authentication has two gates, both of which must pass:
//!
//! 1. [`TokenSigner::verify_signature`] - signature and embedded expiry,
//!    no store access
//! 2. [`SessionAuthority::lookup_session`] - a live session row with the
//!    exact token must exist for the account named in the claims
//!
//! Issuing a session deletes every earlier row for the account in the same
//! transaction, so an account has at most one active token.

use crate::error::{AuthError, AuthResult};
use crate::token::TokenSigner;
use chrono::Utc;
use kodbank_core::{
    session_ttl, Identity, IssuedSession, Role, Session, TokenClaims, DEFAULT_SESSION_TTL_SECS,
};
use kodbank_persistence::{AccountRepo, Database, SessionRepo};
use std::fmt;
use tracing::{debug, info, warn};

/// Session Authority settings
#[derive(Clone)]
pub struct SessionConfig {
    /// HS256 signing secret
    pub secret: Vec<u8>,
    pub default_ttl_secs: u64,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            default_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }

    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish()
    }
}

/// Session Authority
#[derive(Debug, Clone)]
pub struct SessionAuthority {
    db: Database,
    signer: TokenSigner,
    default_ttl_secs: u64,
}

impl SessionAuthority {
    pub fn new(db: Database, config: &SessionConfig) -> AuthResult<Self> {
        // Reject a bad default up front rather than on the first login
        session_ttl(None, config.default_ttl_secs)?;

        Ok(Self {
            db,
            signer: TokenSigner::new(&config.secret)?,
            default_ttl_secs: config.default_ttl_secs,
        })
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Issue a fresh token for `account_id`, replacing any earlier session.
    ///
    /// The delete and insert commit together: after this returns, the new
    /// token is the only one that authenticates for the account.
    pub async fn issue_session(
        &self,
        account_id: &str,
        role: Role,
        ttl_secs: Option<u64>,
    ) -> AuthResult<IssuedSession> {
        let ttl = session_ttl(ttl_secs, self.default_ttl_secs)?;
        let mut tx = self.db.pool().begin().await?;

        // Write first, so the transaction holds the write lock before it reads
        let replaced = SessionRepo::delete_for_account(&mut *tx, account_id).await?;

        let account = AccountRepo::get_by_id(&mut *tx, account_id)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound(account_id.to_string()))?;

        let now = Utc::now();
        let claims = TokenClaims::new(account_id, &account.username, role, now, ttl);
        let token = self.signer.sign(&claims)?;
        let session = Session::new(account_id, &token, now, claims.expires_at());

        SessionRepo::insert(&mut *tx, &session).await?;
        tx.commit().await?;

        info!(
            account_id = %account_id,
            replaced,
            expires_at = %session.expires_at,
            "session issued"
        );

        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
        })
    }

    /// Resolve a token to the identity it was issued for.
    ///
    /// - bad signature or malformed token: [`AuthError::TokenInvalid`]
    /// - valid signature, past `exp`: [`AuthError::TokenExpired`]
    /// - no live row with this exact token: [`AuthError::TokenRevoked`]
    pub async fn authenticate(&self, token: &str) -> AuthResult<Identity> {
        let claims = self.signer.verify_signature(token).map_err(|err| {
            warn!(kind = %err.kind(), "token rejected at signature check");
            err
        })?;
        self.lookup_session(&claims, token).await
    }

    /// Second authentication gate: the session row must still exist and be
    /// unexpired.
    pub async fn lookup_session(&self, claims: &TokenClaims, token: &str) -> AuthResult<Identity> {
        let now = Utc::now();
        let live = SessionRepo::find_live(self.db.pool(), &claims.uid, token, now).await?;
        match live {
            Some(session) if !session.is_expired_at(now) => Ok(Identity::from(claims)),
            _ => {
                warn!(account_id = %claims.uid, "no live session for token");
                Err(AuthError::TokenRevoked)
            }
        }
    }

    /// Delete the session with this exact token.
    ///
    /// Revoking a token that is already gone is not an error.
    pub async fn revoke(&self, account_id: &str, token: &str) -> AuthResult<()> {
        let removed = SessionRepo::delete_one(self.db.pool(), account_id, token).await?;
        if removed == 0 {
            debug!(account_id = %account_id, "revoke: session already gone");
        } else {
            info!(account_id = %account_id, "session revoked");
        }
        Ok(())
    }

    /// Delete every session whose expiry has passed, returns rows removed
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        let removed = SessionRepo::delete_expired(self.db.pool(), Utc::now()).await?;
        if removed > 0 {
            info!(removed, "expired sessions swept");
        } else {
            debug!("sweep found no expired sessions");
        }
        Ok(removed)
    }

    /// Revoke by token alone, for logout.
    ///
    /// The token's signature is checked first so a forged token cannot name
    /// someone else's account. Expired tokens are still accepted here; their
    /// claims are decoded without the expiry check.
    pub async fn revoke_token(&self, token: &str) -> AuthResult<()> {
        let account_id = match self.signer.verify_signature(token) {
            Ok(claims) => claims.uid,
            Err(AuthError::TokenExpired) => self.signer.decode_expired(token)?.uid,
            Err(err) => {
                debug!(kind = %err.kind(), "logout with unusable token");
                return Err(err);
            }
        };
        self.revoke(&account_id, token).await
    }
}
