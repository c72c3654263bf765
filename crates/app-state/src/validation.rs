//! Credential validation and normalization
//!
//! Register and login share the same rules: emails are trimmed and
//! lower-cased before they are checked or compared, passwords are trimmed and
//! must be at least [`MIN_PASSWORD_LEN`] characters long.

use regex::Regex;
use std::sync::OnceLock;

use crate::account::AuthError;

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// Normalize an email address (trim + lower-case)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an email against the `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Check a password against the minimum length
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Normalized registration input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Trimmed display name
    pub name: String,
    /// Normalized email
    pub email: String,
    /// Trimmed password
    pub password: String,
}

/// Normalized login input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Normalized email
    pub email: String,
    /// Trimmed password
    pub password: String,
}

/// Validate and normalize registration fields
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<Registration, AuthError> {
    let name = name.trim();
    let email = normalize_email(email);
    let password = password.trim();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    check_email_and_password(&email, password)?;

    Ok(Registration {
        name: name.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Validate and normalize login fields
pub fn validate_login(email: &str, password: &str) -> Result<Credentials, AuthError> {
    let email = normalize_email(email);
    let password = password.trim();

    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    check_email_and_password(&email, password)?;

    Ok(Credentials { email, password: password.to_string() })
}

fn check_email_and_password(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    if !is_valid_password(password) {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}
