//! # Kodbank Business
//!
//! Business logic layer - Ledger Engine, Session Authority, accounts.
//!
//! - [`LedgerEngine`]: transfers, balances, transaction history
//! - [`SessionAuthority`]: token issue, authentication, revocation, sweeping
//! - [`AccountService`]: registration, login, logout, profile
//! - [`ServiceContext`]: all of the above over one [`Database`](kodbank_persistence::Database)

pub mod accounts;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod services;
pub mod session;
pub mod sweeper;
pub mod token;

pub use accounts::AccountService;
pub use error::{
    AccountError, AccountResult, AuthError, AuthResult, ErrorKind, LedgerError, LedgerResult,
};
pub use ledger::LedgerEngine;
pub use services::ServiceContext;
pub use session::{SessionAuthority, SessionConfig};
pub use sweeper::{SessionSweeper, SweeperHandle};
pub use token::TokenSigner;
