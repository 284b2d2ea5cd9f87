//! # complyhub-auth
//!
//! Authentication and authorization primitives for ComplyHub.
//!
//! ## Modules
//!
//! - `jwt`: stateless HS256 bearer token creation and validation
//! - `password`: Argon2id password hashing and policy enforcement
//! - `api_key`: organisation API key generation and hashing
//! - `rbac`: closed role enum to capability-set enforcement

pub mod api_key;
pub mod jwt;
pub mod password;
pub mod rbac;

pub use api_key::{GeneratedApiKey, generate_api_key, hash_api_key, parse_api_key};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{Capability, RbacEnforcer, RbacPolicies};
