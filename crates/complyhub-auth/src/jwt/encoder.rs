//! JWT token creation with configurable TTL.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;

use complyhub_core::config::AuthConfig;
use complyhub_core::error::AppError;
use complyhub_entity::user::User;

use super::claims::Claims;

/// Creates signed bearer tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_minutes: i64,
    issuer: String,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The encoded JWT.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: i64::try_from(config.access_token_ttl_minutes).unwrap_or(60),
            issuer: config.issuer.clone(),
        }
    }

    /// Issues a token for `user`.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::minutes(self.ttl_minutes);

        let claims = Claims {
            sub: user.id,
            org: user.organisation_id,
            role: user.role,
            email: user.email.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_at,
        })
    }
}
