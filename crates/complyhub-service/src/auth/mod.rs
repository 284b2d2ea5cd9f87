//! Sign-up, sign-in, credential verification and API key management.

pub mod api_key;
pub mod service;

pub use api_key::{ApiKeyService, CreateApiKeyRequest, CreatedApiKey};
pub use service::{AuthService, AuthSession, SignIn, SignUp};
