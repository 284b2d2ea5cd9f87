//! Organisation API keys.
//!
//! A raw key looks like `chk_<prefix>_<secret>`. The prefix is stored in
//! clear for lookup; only the SHA-256 of the whole raw key is persisted.

pub mod generator;

pub use generator::{GeneratedApiKey, generate_api_key, hash_api_key, parse_api_key};
