//! # Kodbank Core
//!
//! Core domain types for the account ledger and session authority.
//! No I/O lives here: everything is plain data plus input validation.
//!
//! - [`Money`]: fixed-point amounts stored as integer cents
//! - [`Account`], [`Role`], [`NewAccount`]: account holders
//! - [`LedgerEntry`], [`TransferRequest`], [`PageRequest`]: ledger movements
//! - [`Session`], [`TokenClaims`], [`Identity`]: authenticated sessions

pub mod account;
pub mod error;
pub mod ledger;
pub mod money;
pub mod session;
pub mod validation;

pub use account::{Account, AccountProfile, NewAccount, Role};
pub use error::{CoreError, CoreResult};
pub use ledger::{
    EntryKind, EntryStatus, LedgerEntry, PageRequest, TransactionPage, TransferReceipt,
    TransferRequest, DEFAULT_DESCRIPTION, MAX_DESCRIPTION_LEN,
};
pub use money::Money;
pub use session::{
    session_ttl, Identity, IssuedSession, Session, TokenClaims, DEFAULT_SESSION_TTL_SECS,
    MAX_SESSION_TTL_SECS,
};
