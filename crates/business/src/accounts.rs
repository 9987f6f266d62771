//! Account Service - register, login, logout, profile
//!
//! Login and logout delegate to the [`SessionAuthority`]; this module only
//! owns credentials and account creation.

use crate::credentials::{hash_password, verify_password};
use crate::error::{AccountError, AccountResult, AuthError};
use crate::session::SessionAuthority;
use chrono::Utc;
use kodbank_core::{Account, AccountProfile, IssuedSession, Money, NewAccount};
use kodbank_persistence::{AccountRepo, Database};
use tracing::{info, warn};

/// Account Service
#[derive(Debug, Clone)]
pub struct AccountService {
    db: Database,
    sessions: SessionAuthority,
}

impl AccountService {
    pub fn new(db: Database, sessions: SessionAuthority) -> Self {
        Self { db, sessions }
    }

    /// Create a customer account with the starting balance.
    ///
    /// A username or email already on file is [`AccountError::Conflict`],
    /// whether caught by the pre-check or by the unique index on a race.
    pub async fn register(&self, new_account: NewAccount) -> AccountResult<AccountProfile> {
        if AccountRepo::exists_username_or_email(
            self.db.pool(),
            &new_account.username,
            &new_account.email,
        )
        .await?
        {
            warn!(username = %new_account.username, "registration conflict");
            return Err(AccountError::Conflict(new_account.username));
        }

        let account = Account {
            id: Account::generate_id(),
            credential_hash: hash_password(&new_account.password)?,
            username: new_account.username,
            email: new_account.email,
            phone: new_account.phone,
            balance: Money::STARTING_BALANCE,
            role: new_account.role,
            created_at: Utc::now(),
        };

        AccountRepo::insert(self.db.pool(), &account).await?;
        info!(account_id = %account.id, username = %account.username, "account registered");

        Ok(account.profile())
    }

    /// Check credentials and issue a session.
    ///
    /// Unknown username and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ttl_secs: Option<u64>,
    ) -> AccountResult<(IssuedSession, AccountProfile)> {
        let account = match AccountRepo::get_by_username(self.db.pool(), username.trim()).await? {
            Some(account) => account,
            None => {
                warn!(username = %username, "login for unknown username");
                return Err(AccountError::InvalidCredentials);
            }
        };

        if !verify_password(password, &account.credential_hash)? {
            warn!(account_id = %account.id, "login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let session = self
            .sessions
            .issue_session(&account.id, account.role, ttl_secs)
            .await?;
        info!(account_id = %account.id, "login succeeded");

        Ok((session, account.profile()))
    }

    /// End the session carried by `token`.
    ///
    /// Repeating it is a no-op, and so is a token that no longer verifies:
    /// there is nothing left to revoke.
    pub async fn logout(&self, token: &str) -> AccountResult<()> {
        match self.sessions.revoke_token(token).await {
            Ok(()) | Err(AuthError::TokenInvalid(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Profile of an account, balance included
    pub async fn profile(&self, account_id: &str) -> AccountResult<AccountProfile> {
        AccountRepo::get_by_id(self.db.pool(), account_id)
            .await?
            .map(|account| account.profile())
            .ok_or_else(|| AccountError::AccountNotFound(account_id.to_string()))
    }

    pub fn sessions(&self) -> &SessionAuthority {
        &self.sessions
    }
}
