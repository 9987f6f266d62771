//! Subcommand handlers

pub mod account;
pub mod ledger;
pub mod session;
