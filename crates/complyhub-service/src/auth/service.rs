//! Email sign-up / sign-in and bearer credential verification.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::ValidateEmail;

use complyhub_auth::jwt::IssuedToken;
use complyhub_auth::{JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator, parse_api_key};
use complyhub_core::AppError;
use complyhub_database::store::{OrganisationStore, UserStore};
use complyhub_entity::user::{CreateUser, Role, User};

use super::api_key::ApiKeyService;
use crate::context::RequestContext;

const MAX_NAME_LEN: usize = 255;

/// Sign-up request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Name of the new organisation. Defaults to the user's name.
    #[serde(alias = "organisation_name")]
    pub organisation_name: Option<String>,
}

/// Sign-in request.
#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// A signed-in user with a fresh bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// The user.
    pub user: User,
    /// Bearer token for subsequent requests.
    pub token: IssuedToken,
}

/// Handles account creation and credential checks.
#[derive(Debug, Clone)]
pub struct AuthService {
    /// Organisation store.
    organisations: Arc<dyn OrganisationStore>,
    /// User store.
    users: Arc<dyn UserStore>,
    /// Password hasher.
    hasher: PasswordHasher,
    /// Password policy.
    password_policy: PasswordValidator,
    /// Token issuer.
    encoder: JwtEncoder,
    /// Token verifier.
    decoder: JwtDecoder,
    /// API key verification.
    api_keys: ApiKeyService,
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        organisations: Arc<dyn OrganisationStore>,
        users: Arc<dyn UserStore>,
        password_policy: PasswordValidator,
        encoder: JwtEncoder,
        decoder: JwtDecoder,
        api_keys: ApiKeyService,
    ) -> Self {
        Self {
            organisations,
            users,
            hasher: PasswordHasher::new(),
            password_policy,
            encoder,
            decoder,
            api_keys,
        }
    }

    /// Create an organisation and its first `ADMIN` user.
    pub async fn sign_up(&self, req: SignUp) -> Result<AuthSession, AppError> {
        let name = req.name.trim().to_string();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "name must be 1 to {MAX_NAME_LEN} characters"
            )));
        }
        let email = normalize_email(&req.email);
        if !email.validate_email() {
            return Err(AppError::validation("email is not a valid address"));
        }
        self.password_policy.validate(&req.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let organisation_name = req
            .organisation_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| name.clone());
        let password_hash = self.hasher.hash_password(&req.password)?;

        let organisation = self.organisations.create(&organisation_name).await?;
        let user = self
            .users
            .create(&CreateUser {
                organisation_id: organisation.id,
                email,
                name,
                password_hash,
                role: Role::Admin,
            })
            .await?;

        info!(
            user_id = %user.id,
            organisation_id = %organisation.id,
            "User signed up"
        );
        let token = self.encoder.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Verify email and password. Every failure is the same
    /// authentication error.
    pub async fn sign_in(&self, req: SignIn) -> Result<AuthSession, AppError> {
        let invalid = || AppError::authentication("Invalid email or password");
        let email = normalize_email(&req.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Sign-in for unknown email");
            return Err(invalid());
        };
        if !self.hasher.verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(invalid());
        }

        info!(user_id = %user.id, "User signed in");
        let token = self.encoder.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    /// The user behind the current request.
    pub async fn me(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::authentication("User no longer exists"))
    }

    /// Verify a bearer credential, which is either a JWT or an API key.
    pub async fn authenticate(&self, credential: &str) -> Result<RequestContext, AppError> {
        if parse_api_key(credential).is_some() {
            return self.api_keys.authenticate(credential).await;
        }
        let claims = self.decoder.decode(credential)?;
        Ok(RequestContext::for_user(claims.sub, claims.org, claims.role))
    }

    /// Verify an API key presented in `X-API-Key`.
    pub async fn authenticate_api_key(&self, raw: &str) -> Result<RequestContext, AppError> {
        self.api_keys.authenticate(raw).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
