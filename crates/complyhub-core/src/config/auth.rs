//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Token issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_minutes: default_access_ttl(),
            issuer: default_issuer(),
            password_min_length: default_password_min(),
        }
    }
}

/// Placeholder secret shipped in `config/default.toml`.
pub const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION_0123456789";

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_issuer() -> String {
    "complyhub".to_string()
}

fn default_password_min() -> usize {
    8
}
