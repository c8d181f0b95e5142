//! Checksum calculation for model identifiers.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of serialized model content.
///
/// Saved models are addressed by the hex digest of their serialized form,
/// so identical models deduplicate and a corrupted payload cannot be loaded
/// under a stale identifier.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"weights": [0.5, 1.0]}"#;
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
    }

    #[test]
    fn test_different_content_different_checksum() {
        let a = calculate_checksum(r#"{"weights": [0.5]}"#);
        let b = calculate_checksum(r#"{"weights": [0.6]}"#);
        assert_ne!(a, b);
    }
}
