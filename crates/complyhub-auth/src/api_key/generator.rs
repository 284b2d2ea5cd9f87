//! API key generation, parsing and hashing.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Marker at the start of every raw key.
pub const KEY_MARKER: &str = "chk";
/// Random bytes in the public prefix.
const PREFIX_BYTES: usize = 4;
/// Random bytes in the secret part.
const SECRET_BYTES: usize = 24;

/// A key as handed to the user, plus what gets persisted.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// Full raw key. Shown once.
    pub raw: String,
    /// Public lookup prefix.
    pub prefix: String,
    /// Hex SHA-256 of `raw`.
    pub hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let mut prefix = [0u8; PREFIX_BYTES];
    let mut secret = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut prefix);
    OsRng.fill_bytes(&mut secret);

    let prefix = hex::encode(prefix);
    let raw = format!("{KEY_MARKER}_{prefix}_{}", hex::encode(secret));
    let hash = hash_api_key(&raw);
    GeneratedApiKey { raw, prefix, hash }
}

/// Extract the lookup prefix from a raw key, or `None` if the key is not
/// in `chk_<prefix>_<secret>` form.
pub fn parse_api_key(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix(KEY_MARKER)?.strip_prefix('_')?;
    let (prefix, secret) = rest.split_once('_')?;
    let well_formed = prefix.len() == PREFIX_BYTES * 2
        && secret.len() == SECRET_BYTES * 2
        && prefix.chars().chain(secret.chars()).all(|c| c.is_ascii_hexdigit());
    well_formed.then_some(prefix)
}

/// Hex SHA-256 of a raw key.
pub fn hash_api_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_parses_back() {
        let key = generate_api_key();
        assert!(key.raw.starts_with("chk_"));
        assert_eq!(parse_api_key(&key.raw), Some(key.prefix.as_str()));
        assert_eq!(hash_api_key(&key.raw), key.hash);
        assert_eq!(key.hash.len(), 64);
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_api_key().raw, generate_api_key().raw);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert_eq!(parse_api_key("eyJhbGciOiJIUzI1NiJ9.e30.sig"), None);
        assert_eq!(parse_api_key("chk_abc_def"), None);
        assert_eq!(parse_api_key("chk_zzzzzzzz_00"), None);
    }
}
