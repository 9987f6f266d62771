//! Input validation for registration fields.
//!
//! Each function returns the normalised value (trimmed, email lower-cased)
//! or a [`CoreError`] naming the rule that failed.

use crate::error::{CoreError, CoreResult};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 80;
pub const EMAIL_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PHONE_MIN_LEN: usize = 7;
pub const PHONE_MAX_LEN: usize = 25;

/// 3-80 characters of `[A-Za-z0-9_]`
pub fn username(raw: &str) -> CoreResult<String> {
    let value = raw.trim();
    let len = value.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(CoreError::InvalidUsername(format!(
            "must be {}-{} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::InvalidUsername(
            "may only contain letters, numbers and underscores".to_string(),
        ));
    }
    Ok(value.to_string())
}

pub fn email(raw: &str) -> CoreResult<String> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() || value.len() > EMAIL_MAX_LEN || value.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidEmail(raw.trim().to_string()));
    }

    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(CoreError::InvalidEmail(value)),
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok {
        return Err(CoreError::InvalidEmail(value));
    }
    Ok(value)
}

/// At least 8 characters with an upper-case letter, a lower-case letter and a digit
pub fn password(raw: &str) -> CoreResult<()> {
    if raw.chars().count() < PASSWORD_MIN_LEN {
        return Err(CoreError::InvalidPassword(format!(
            "must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    let has_upper = raw.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = raw.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(CoreError::InvalidPassword(
            "must contain an uppercase letter, lowercase letter and a digit".to_string(),
        ));
    }
    Ok(())
}

pub fn phone(raw: &str) -> CoreResult<String> {
    let value = raw.trim();
    let len = value.chars().count();
    let charset_ok = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '));
    if !(PHONE_MIN_LEN..=PHONE_MAX_LEN).contains(&len) || !charset_ok {
        return Err(CoreError::InvalidPhone(value.to_string()));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(username(" alice ").unwrap(), "alice");
        assert!(username("ab").is_err());
        assert!(username(&"a".repeat(81)).is_err());
        assert!(username(&"a".repeat(80)).is_ok());
        assert!(username("alice-smith").is_err());
        assert!(username("alice smith").is_err());
        assert!(username("Alice_Smith_99").is_ok());
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(email("Bob@Example.com").unwrap(), "bob@example.com");
        assert!(email("bob").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("bob@example").is_err());
        assert!(email("bob@@example.com").is_err());
        assert!(email("bob@example..com").is_err());
        assert!(email("bo b@example.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(password("Secret123").is_ok());
        assert!(password("Sec123").is_err());
        assert!(password("secret123").is_err());
        assert!(password("SECRET123").is_err());
        assert!(password("SecretPass").is_err());
    }

    #[test]
    fn test_phone_rules() {
        assert!(phone("+91 98765-43210").is_ok());
        assert!(phone("12345").is_err());
        assert!(phone("555-CALL-NOW").is_err());
    }
}
