use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{CredentialsRequest, SignupRequest};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 32;
/// bcrypt ignores everything past this many bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;
pub const NAME_MAX_LEN: usize = 100;

/// A request field that failed its schema check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Signup input after normalization and schema checks.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Sign-in input after normalization and schema checks.
#[derive(Debug, Clone)]
pub struct ValidCredentials {
    pub email: String,
    pub password: String,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::new("email", "Invalid email"));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len == 0 {
        return Err(ValidationError::new("password", "Password is required"));
    }
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be more than 8 characters",
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be less than 32 characters",
        ));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(ValidationError::new(
            "password",
            "Password must be at most 72 bytes",
        ));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::new(
            "name",
            "Name must be less than 100 characters",
        ));
    }
    Ok(())
}

impl SignupRequest {
    pub fn validate(self) -> Result<ValidSignup, ValidationError> {
        let name = self.name.trim().to_string();
        let email = normalize_email(&self.email);
        check_name(&name)?;
        check_email(&email)?;
        check_password(&self.password)?;
        Ok(ValidSignup {
            name,
            email,
            password: self.password,
        })
    }
}

impl CredentialsRequest {
    pub fn validate(self) -> Result<ValidCredentials, ValidationError> {
        let email = normalize_email(&self.email);
        check_email(&email)?;
        check_password(&self.password)?;
        Ok(ValidCredentials {
            email,
            password: self.password,
        })
    }
}
