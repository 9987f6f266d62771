//! Service context - wires the services around one database handle.

use crate::accounts::AccountService;
use crate::error::AuthResult;
use crate::ledger::LedgerEngine;
use crate::session::{SessionAuthority, SessionConfig};
use crate::sweeper::{SessionSweeper, SweeperHandle};
use kodbank_persistence::Database;
use std::time::Duration;

/// Context for business operations
#[derive(Debug, Clone)]
pub struct ServiceContext {
    db: Database,
    ledger: LedgerEngine,
    sessions: SessionAuthority,
    accounts: AccountService,
}

impl ServiceContext {
    /// Build every service over `db`
    pub fn new(db: Database, session_config: &SessionConfig) -> AuthResult<Self> {
        let sessions = SessionAuthority::new(db.clone(), session_config)?;
        Ok(Self {
            ledger: LedgerEngine::new(db.clone()),
            accounts: AccountService::new(db.clone(), sessions.clone()),
            sessions,
            db,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    pub fn sessions(&self) -> &SessionAuthority {
        &self.sessions
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    /// Start the expired-session sweeper on the current runtime
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        SessionSweeper::spawn(self.sessions.clone(), interval)
    }
}
