//! Object key generation.
//!
//! Keys are `uploads/{uuid v4}`: random, globally unique and independent of
//! the tenant, so two tenants can never address the same object.

use docket_core::constants::UPLOAD_KEY_PREFIX;
use uuid::Uuid;

pub fn generate_object_key() -> String {
    format!("{}/{}", UPLOAD_KEY_PREFIX, Uuid::new_v4())
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Storage key is empty".to_string());
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err("Storage key contains invalid characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_prefixed_and_unique() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_object_key()).collect();
        assert_eq!(keys.len(), 1000);
        for key in &keys {
            assert!(key.starts_with("uploads/"));
            let id = key.trim_start_matches("uploads/");
            assert!(Uuid::parse_str(id).is_ok());
        }
    }

    #[test]
    fn generated_keys_pass_validation() {
        assert!(validate_key(&generate_object_key()).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("uploads\\..\\x").is_err());
        assert!(validate_key("").is_err());
    }
}
