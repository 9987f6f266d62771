//! # Account Module
//!
//! Account, Role and the registration input that creates an account.
//! Balances are only ever mutated by the ledger engine; this module just
//! describes what an account looks like.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of an account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Role::Customer),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account.
///
/// One account per user; the user's login name is the account's username.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    /// Argon2 PHC string, never shown in Debug output
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub balance: Money,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Generate a fresh opaque account id
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Public view of the account, safe to hand to the API layer
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("credential_hash", &"<redacted>")
            .field("balance", &self.balance)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account {} ({}, role: {}, balance: {})",
            self.id, self.username, self.role, self.balance
        )
    }
}

/// Account data without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input.
///
/// Built through [`NewAccount::new`], which normalises and checks every
/// field. The password is kept in clear only until it is hashed.
#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: Role,
}

impl NewAccount {
    /// Validate registration input.
    ///
    /// Public registration only ever creates `customer` accounts; asking for
    /// any other role is rejected rather than silently downgraded.
    pub fn new(
        username: &str,
        email: &str,
        password: &str,
        phone: &str,
        role: Option<&str>,
    ) -> CoreResult<Self> {
        let username = validation::username(username)?;
        let email = validation::email(email)?;
        validation::password(password)?;
        let phone = validation::phone(phone)?;

        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            None => Role::Customer,
            Some(r) => match Role::from_str(r) {
                Some(Role::Customer) => Role::Customer,
                _ => return Err(CoreError::InvalidRole(r.to_string())),
            },
        };

        Ok(Self {
            username,
            email,
            password: password.to_string(),
            phone,
            role,
        })
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .field("role", &self.role)
            .finish()
    }
}
