//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use complyhub_core::config::AuthConfig;
use complyhub_core::error::AppError;

use super::claims::Claims;

/// Validates bearer tokens. Tokens are stateless: there is no server-side
/// session or blocklist.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication("Invalid token"),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use complyhub_entity::user::{Role, User};

    use super::*;
    use crate::jwt::JwtEncoder;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            organisation_id: Uuid::new_v4(),
            email: "officer@example.org".into(),
            name: "Officer".into(),
            password_hash: String::new(),
            role: Role::Officer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip_claims() {
        let config = AuthConfig::default();
        let user = user();
        let token = JwtEncoder::new(&config).issue(&user).unwrap();
        let claims = JwtDecoder::new(&config).decode(&token.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.org, user.organisation_id);
        assert_eq!(claims.role, Role::Officer);
    }

    #[test]
    fn test_rejects_foreign_secret() {
        let config = AuthConfig::default();
        let other = AuthConfig {
            jwt_secret: "a-completely-different-secret".into(),
            ..AuthConfig::default()
        };
        let token = JwtEncoder::new(&other).issue(&user()).unwrap();
        let err = JwtDecoder::new(&config).decode(&token.access_token).unwrap_err();
        assert!(err.is(complyhub_core::ErrorKind::Authentication));
    }

    #[test]
    fn test_rejects_garbage() {
        let decoder = JwtDecoder::new(&AuthConfig::default());
        assert!(decoder.decode("not-a-jwt").is_err());
    }
}
