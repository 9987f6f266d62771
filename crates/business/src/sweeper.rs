//! Background removal of expired sessions.
//!
//! Expired rows already fail authentication on their own; the sweeper only
//! keeps the sessions table from growing without bound.

use crate::session::SessionAuthority;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Periodic `sweep_expired` runner
pub struct SessionSweeper;

impl SessionSweeper {
    /// Spawn the sweep loop on the current runtime.
    ///
    /// The first sweep runs immediately, then once per `interval`. A failed
    /// sweep is logged and the loop keeps going.
    pub fn spawn(authority: SessionAuthority, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "session sweeper started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // Sender dropped counts as shutdown too
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("session sweeper received shutdown signal");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match authority.sweep_expired().await {
                            Ok(removed) => debug!(removed, "sweep tick done"),
                            Err(err) => error!(kind = %err.kind(), error = %err, "session sweep failed"),
                        }
                    }
                }
            }
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Handle to a running sweeper
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Ask the loop to stop after the current tick
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal shutdown and wait for the task to exit
    pub async fn join(self) {
        self.shutdown();
        if let Err(err) = self.join.await {
            error!(error = %err, "session sweeper task panicked");
        }
    }
}
