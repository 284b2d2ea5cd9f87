//! Password policy enforcement.

use complyhub_core::config::AuthConfig;
use complyhub_core::error::AppError;

/// Longest password accepted, to bound hashing cost.
const MAX_PASSWORD_LENGTH: usize = 256;

/// Validates candidate passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Check a candidate password.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "Password must be at most {MAX_PASSWORD_LENGTH} characters"
            )));
        }
        if password.trim().is_empty() {
            return Err(AppError::validation("Password must not be blank"));
        }
        Ok(())
    }
}
