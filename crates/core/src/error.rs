//! # Error Module
//!
//! Validation errors raised by the domain types before any store access.

use crate::money::Money;
use thiserror::Error;

/// Core domain errors.
///
/// Everything in here is a rejected input: nothing has been read from or
/// written to the store when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // === Money errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount out of range: {amount} (allowed {min} - {max})")]
    AmountOutOfRange { amount: String, min: Money, max: Money },

    // === Transfer errors ===
    #[error("Description too long: {len} characters (max {max})")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("Recipient username is required")]
    MissingRecipient,

    #[error("Cannot transfer money to yourself")]
    SelfTransfer,

    // === Account errors ===
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    // === Session errors ===
    #[error("Invalid session TTL: {0} seconds")]
    InvalidTtl(u64),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error came from the self-transfer guard
    pub fn is_self_transfer(&self) -> bool {
        matches!(self, CoreError::SelfTransfer)
    }

    /// Whether the error concerns a monetary amount
    pub fn is_amount_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_) | CoreError::AmountOutOfRange { .. }
        )
    }
}
