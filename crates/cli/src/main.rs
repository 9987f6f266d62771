//! Kodbank CLI - accounts, transfers and sessions from the command line
//!
//! Usage:
//! ```bash
//! kodbank init
//! kodbank register alice --email alice@example.com --phone 5550100 --password Secret123
//! kodbank login alice --password Secret123
//! kodbank transfer bob 2500 --description rent
//! kodbank balance
//! kodbank history --limit 10
//! kodbank logout
//! kodbank serve --sweep-interval 900
//! ```
//!
//! Every option can also come from the environment (`KODBANK_*`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

use commands::{account, ledger, session};

/// Kodbank - account ledger and session authority
#[derive(Parser)]
#[command(name = "kodbank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database URL
    #[arg(long, env = "KODBANK_DATABASE_URL", default_value = "sqlite:data/kodbank.db", global = true)]
    pub database_url: String,

    /// Token signing secret
    #[arg(long, env = "KODBANK_JWT_SECRET", hide_env_values = true, global = true)]
    pub jwt_secret: Option<String>,

    /// Default session lifetime in seconds
    #[arg(long, env = "KODBANK_SESSION_TTL", default_value_t = 3600, global = true)]
    pub session_ttl: u64,

    /// Maximum pooled connections
    #[arg(long, env = "KODBANK_MAX_CONNECTIONS", default_value_t = 10, global = true)]
    pub max_connections: u32,

    /// Seconds a transfer waits on a held lock before giving up
    #[arg(long, env = "KODBANK_LOCK_TIMEOUT", default_value_t = 5, global = true)]
    pub lock_timeout: u64,

    /// Where the current session token is kept between commands
    #[arg(long, env = "KODBANK_TOKEN_FILE", default_value = "data/.kodbank-token", global = true)]
    pub token_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Show database status
    Status,

    /// Register a new customer account
    Register {
        username: String,
        #[arg(long, short)]
        email: String,
        #[arg(long, short)]
        phone: String,
        #[arg(long, env = "KODBANK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Only `customer` is accepted
        #[arg(long)]
        role: Option<String>,
    },

    /// Log in and store the session token
    Login {
        username: String,
        #[arg(long, env = "KODBANK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Session lifetime in seconds (defaults to --session-ttl)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Revoke the stored session token
    Logout,

    /// Show the logged-in account
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Show the current balance
    Balance,

    /// Send money to another account
    Transfer {
        /// Recipient username
        recipient: String,
        /// Amount, at most two decimal places
        amount: Decimal,
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List transactions, newest first
    History {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long)]
        json: bool,
    },

    /// Delete expired sessions once
    Sweep,

    /// Run the expired-session sweeper until interrupted
    Serve {
        /// Seconds between sweeps
        #[arg(long, env = "KODBANK_SWEEP_INTERVAL", default_value_t = 900)]
        sweep_interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init => {
            db::init_database(&cli).await?;
        }

        Commands::Status => {
            db::show_status(&cli).await?;
        }

        Commands::Register {
            username,
            email,
            phone,
            password,
            role,
        } => {
            account::register(&cli, username, email, phone, password, role.as_deref()).await?;
        }

        Commands::Login { username, password, ttl } => {
            account::login(&cli, username, password, *ttl).await?;
        }

        Commands::Logout => {
            account::logout(&cli).await?;
        }

        Commands::Whoami { json } => {
            account::whoami(&cli, *json).await?;
        }

        Commands::Balance => {
            ledger::balance(&cli).await?;
        }

        Commands::Transfer {
            recipient,
            amount,
            description,
        } => {
            ledger::transfer(&cli, recipient, *amount, description.as_deref()).await?;
        }

        Commands::History { limit, offset, json } => {
            ledger::history(&cli, *limit, *offset, *json).await?;
        }

        Commands::Sweep => {
            session::sweep(&cli).await?;
        }

        Commands::Serve { sweep_interval } => {
            session::serve(&cli, *sweep_interval).await?;
        }
    }

    Ok(())
}
