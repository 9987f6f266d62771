//! Business layer errors
//!
//! One error enum per service, all mapping onto a shared [`ErrorKind`] so the
//! API layer can translate failures into user-facing messages without
//! matching on every variant.

use kodbank_core::{CoreError, Money};
use kodbank_persistence::PersistenceError;
use std::fmt;
use thiserror::Error;

/// Failure categories callers are expected to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input, rejected before touching the store
    Validation,
    InsufficientFunds,
    RecipientNotFound,
    AccountNotFound,
    /// Transient; the transaction was rolled back and may be retried
    LockTimeout,
    TokenExpired,
    TokenInvalid,
    TokenRevoked,
    /// Username or email already registered
    Conflict,
    InvalidCredentials,
    StoreUnavailable,
    /// Signing or hashing failed
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::RecipientNotFound => "recipient_not_found",
            ErrorKind::AccountNotFound => "account_not_found",
            ErrorKind::LockTimeout => "lock_timeout",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::TokenInvalid => "token_invalid",
            ErrorKind::TokenRevoked => "token_revoked",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::LockTimeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Ledger errors
// ============================================================================

/// Ledger Engine errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Store unavailable: {0}")]
    Store(PersistenceError),
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::RecipientNotFound(_) => ErrorKind::RecipientNotFound,
            LedgerError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            LedgerError::LockTimeout(_) => ErrorKind::LockTimeout,
            LedgerError::Store(_) => ErrorKind::StoreUnavailable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<PersistenceError> for LedgerError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::LockTimeout(msg) => LedgerError::LockTimeout(msg),
            other => LedgerError::Store(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        PersistenceError::from(err).into()
    }
}

// ============================================================================
// Session errors
// ============================================================================

/// Session Authority errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Session expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Session invalid or revoked")]
    TokenRevoked,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Store unavailable: {0}")]
    Store(#[from] PersistenceError),
}

/// Result type alias for session operations
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::TokenExpired => ErrorKind::TokenExpired,
            AuthError::TokenInvalid(_) => ErrorKind::TokenInvalid,
            AuthError::TokenRevoked => ErrorKind::TokenRevoked,
            AuthError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Signing(_) => ErrorKind::Internal,
            AuthError::Store(PersistenceError::LockTimeout(_)) => ErrorKind::LockTimeout,
            AuthError::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Store(err.into())
    }
}

// ============================================================================
// Account errors
// ============================================================================

/// Registration / login errors
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Username or email is already registered: {0}")]
    Conflict(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Session error: {0}")]
    Session(#[from] AuthError),

    #[error("Store unavailable: {0}")]
    Store(PersistenceError),
}

/// Result type alias for account operations
pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Validation(_) => ErrorKind::Validation,
            AccountError::Conflict(_) => ErrorKind::Conflict,
            AccountError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AccountError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            AccountError::Hashing(_) => ErrorKind::Internal,
            AccountError::Session(err) => err.kind(),
            AccountError::Store(PersistenceError::LockTimeout(_)) => ErrorKind::LockTimeout,
            AccountError::Store(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl From<PersistenceError> for AccountError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::UniqueViolation(msg) => AccountError::Conflict(msg),
            other => AccountError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_error() {
        let err = LedgerError::InsufficientFunds {
            requested: Money::from_cents(10_000),
            available: Money::from_cents(5_000),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(err.to_string().contains("requested 100.00"));
        assert!(err.to_string().contains("available 50.00"));
    }

    #[test]
    fn test_lock_timeout_is_retryable() {
        let err = LedgerError::from(PersistenceError::LockTimeout("database is locked".to_string()));
        assert_eq!(err.kind(), ErrorKind::LockTimeout);
        assert!(err.is_retryable());

        let err = LedgerError::from(PersistenceError::Configuration("bad url".to_string()));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_self_transfer_is_validation() {
        let err = LedgerError::from(CoreError::SelfTransfer);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_auth_kinds_are_distinct() {
        assert_eq!(AuthError::TokenExpired.kind(), ErrorKind::TokenExpired);
        assert_eq!(AuthError::TokenInvalid("bad".to_string()).kind(), ErrorKind::TokenInvalid);
        assert_eq!(AuthError::TokenRevoked.kind(), ErrorKind::TokenRevoked);
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = AccountError::from(PersistenceError::UniqueViolation("accounts.username".to_string()));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = AccountError::from(AuthError::TokenRevoked);
        assert_eq!(err.kind(), ErrorKind::TokenRevoked);
    }
}
