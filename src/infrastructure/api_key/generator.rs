//! API Key generation
//!
//! Generates cryptographically secure API keys with hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::infrastructure::crypto::constant_time_eq;

/// Type prefix of every gateway key
pub const LIVE_KEY_PREFIX: &str = "gw_live_";

/// Random characters after the type prefix that form the lookup prefix
const LOOKUP_CHARS: usize = 8;

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key (only shown once at creation)
    pub key: String,
    /// The key prefix for identification
    pub prefix: String,
    /// The hashed key for storage
    pub hash: String,
}

/// Generator for secure API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
    key_bytes: usize,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_bytes: 32,
        }
    }

    pub fn live() -> Self {
        Self::new(LIVE_KEY_PREFIX)
    }

    pub fn with_key_bytes(mut self, bytes: usize) -> Self {
        self.key_bytes = bytes;
        self
    }

    /// `<prefix><base64url random>`; 32 bytes encode to 43 characters
    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let encoded = URL_SAFE_NO_PAD.encode(&random_bytes);
        let key = format!("{}{}", self.prefix, encoded);
        let unique_prefix = format!(
            "{}{}",
            self.prefix,
            &encoded[..LOOKUP_CHARS.min(encoded.len())]
        );

        GeneratedApiKey {
            hash: self.hash_key(&key),
            key,
            prefix: unique_prefix,
        }
    }

    pub fn hash_key(&self, key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        format!("sha256${}", URL_SAFE_NO_PAD.encode(digest))
    }

    pub fn verify_key(&self, key: &str, stored_hash: &str) -> bool {
        constant_time_eq(&self.hash_key(key), stored_hash)
    }

    /// Lookup prefix of a presented key, `None` when it is not one of ours
    pub fn extract_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        let random = key.strip_prefix(self.prefix.as_str())?;

        if random.len() < LOOKUP_CHARS || !random.is_char_boundary(LOOKUP_CHARS) {
            return None;
        }

        Some(&key[..self.prefix.len() + LOOKUP_CHARS])
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let generated = ApiKeyGenerator::live().generate();

        assert!(generated.key.starts_with("gw_live_"));
        assert_eq!(generated.key.len(), "gw_live_".len() + 43);
        assert_eq!(generated.prefix.len(), "gw_live_".len() + 8);
        assert!(generated.key.starts_with(&generated.prefix));
        assert!(generated.hash.starts_with("sha256$"));
    }

    #[test]
    fn test_key_uniqueness() {
        let generator = ApiKeyGenerator::live();
        let first = generator.generate();
        let second = generator.generate();

        assert_ne!(first.key, second.key);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_verify_key() {
        let generator = ApiKeyGenerator::live();
        let generated = generator.generate();

        assert!(generator.verify_key(&generated.key, &generated.hash));
        assert!(!generator.verify_key("gw_live_wrong", &generated.hash));
    }

    #[test]
    fn test_hash_deterministic() {
        let generator = ApiKeyGenerator::live();
        assert_eq!(
            generator.hash_key("gw_live_test123"),
            generator.hash_key("gw_live_test123")
        );
    }

    #[test]
    fn test_extract_prefix() {
        let generator = ApiKeyGenerator::live();

        assert_eq!(
            generator.extract_prefix("gw_live_abc12345xyz"),
            Some("gw_live_abc12345")
        );
        assert_eq!(generator.extract_prefix("gw_live_abc"), None);
        assert_eq!(generator.extract_prefix("pk_live_abc12345xyz"), None);
        assert_eq!(generator.extract_prefix("noprefix"), None);
    }

    #[test]
    fn test_custom_key_bytes() {
        let generated = ApiKeyGenerator::live().with_key_bytes(64).generate();

        // 64 bytes base64-encoded = 86 chars, plus prefix
        assert_eq!(generated.key.len(), "gw_live_".len() + 86);
    }
}
