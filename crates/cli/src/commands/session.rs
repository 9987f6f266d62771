//! Session commands and the stored token
//!
//! The token file stands in for a browser cookie: `login` writes it, every
//! authenticated command reads it, `logout` removes it.

use anyhow::{Context, Result};
use kodbank_business::ServiceContext;
use kodbank_core::Identity;
use std::path::Path;
use std::time::Duration;

use crate::db;
use crate::Cli;

/// Persist the token for later commands
pub fn save_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    std::fs::write(path, token).with_context(|| format!("Failed to write token file {:?}", path))
}

/// Read the stored token, if any
pub fn load_token(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("Failed to read token file {:?}", path)),
    }
}

pub fn clear_token(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Failed to remove token file {:?}", path)),
    }
}

/// Authenticate the stored token
pub async fn current_identity(ctx: &ServiceContext, token_file: &Path) -> Result<Identity> {
    let token = load_token(token_file)?.context("Not logged in. Run 'kodbank login' first.")?;
    let identity = ctx
        .sessions()
        .authenticate(&token)
        .await
        .context("Session is no longer valid. Run 'kodbank login' again.")?;
    Ok(identity)
}

/// Delete expired sessions once
pub async fn sweep(cli: &Cli) -> Result<()> {
    let ctx = db::services(cli).await?;
    let removed = ctx.sessions().sweep_expired().await.context("Sweep failed")?;
    println!("🧹 Removed {} expired session(s)", removed);
    ctx.db().close().await;
    Ok(())
}

/// Run the sweeper until Ctrl-C
pub async fn serve(cli: &Cli, sweep_interval: u64) -> Result<()> {
    if sweep_interval == 0 {
        anyhow::bail!("--sweep-interval must be at least 1 second");
    }

    let ctx = db::services(cli).await?;
    let handle = ctx.spawn_sweeper(Duration::from_secs(sweep_interval));
    println!("🚀 Session sweeper running every {}s, press Ctrl-C to stop", sweep_interval);

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;

    println!("🛑 Shutting down...");
    handle.join().await;
    ctx.db().close().await;
    Ok(())
}
