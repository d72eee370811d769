//! API key generation and hashing.
//!
//! Keys are random and high-entropy, so a single SHA-256 is enough to store
//! them: lookup is by exact hash and needs no per-key salt.

use rand::Rng;
use sha2::{Digest, Sha256};

const API_KEY_PREFIX: &str = "dk_live_";

/// Characters of the raw key kept in clear for identification in listings.
const KEY_PREFIX_LEN: usize = 16;

/// Generate a new key: `dk_live_<40 hex chars>`.
pub fn generate_api_key() -> String {
    let mut rng = rand::rng();
    let random_bytes: [u8; 20] = rng.random();
    format!("{}{}", API_KEY_PREFIX, hex::encode(random_bytes))
}

/// Hex-encoded SHA-256 of the raw key, as stored in `api_keys.key_hash`.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

pub fn extract_key_prefix(key: &str) -> String {
    key.chars().take(KEY_PREFIX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_prefix_and_differ() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + 40);
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        let hash = hash_api_key("dk_live_example");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("dk_live_example"));
        assert_ne!(hash, hash_api_key("dk_live_other"));
        // sha256("abc")
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn prefix_is_truncated() {
        assert_eq!(extract_key_prefix("dk_live_0123456789abcdef"), "dk_live_01234567");
        assert_eq!(extract_key_prefix("short"), "short");
    }
}
