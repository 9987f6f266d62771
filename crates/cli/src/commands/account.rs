//! Account commands - register, login, logout, whoami

use anyhow::{Context, Result};
use kodbank_core::{AccountProfile, NewAccount};

use crate::commands::session::{clear_token, current_identity, load_token, save_token};
use crate::db;
use crate::Cli;

pub async fn register(
    cli: &Cli,
    username: &str,
    email: &str,
    phone: &str,
    password: &str,
    role: Option<&str>,
) -> Result<()> {
    let new_account = NewAccount::new(username, email, password, phone, role)
        .context("Invalid registration details")?;

    let ctx = db::services(cli).await?;
    let profile = ctx
        .accounts()
        .register(new_account)
        .await
        .context("Registration failed")?;

    println!("✅ Registered account:");
    print_profile(&profile);

    ctx.db().close().await;
    Ok(())
}

pub async fn login(cli: &Cli, username: &str, password: &str, ttl: Option<u64>) -> Result<()> {
    let ctx = db::services(cli).await?;
    let (session, profile) = ctx
        .accounts()
        .login(username, password, ttl)
        .await
        .context("Login failed")?;

    save_token(&cli.token_file, &session.token)?;

    println!("✅ Logged in as {}", profile.username);
    println!("   Session expires: {}", session.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));

    ctx.db().close().await;
    Ok(())
}

pub async fn logout(cli: &Cli) -> Result<()> {
    let Some(token) = load_token(&cli.token_file)? else {
        println!("ℹ️  Not logged in");
        return Ok(());
    };

    let ctx = db::services(cli).await?;
    ctx.accounts().logout(&token).await.context("Logout failed")?;
    clear_token(&cli.token_file)?;

    println!("👋 Logged out");
    ctx.db().close().await;
    Ok(())
}

pub async fn whoami(cli: &Cli, json: bool) -> Result<()> {
    let ctx = db::services(cli).await?;
    let identity = current_identity(&ctx, &cli.token_file).await?;
    let profile = ctx
        .accounts()
        .profile(&identity.account_id)
        .await
        .context("Failed to load profile")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }

    ctx.db().close().await;
    Ok(())
}

fn print_profile(profile: &AccountProfile) {
    println!("   Account ID: {}", profile.id);
    println!("   Username:   {}", profile.username);
    println!("   Email:      {}", profile.email);
    println!("   Phone:      {}", profile.phone);
    println!("   Role:       {}", profile.role.as_str());
    println!("   Balance:    {}", profile.balance);
    println!("   Created:    {}", profile.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
