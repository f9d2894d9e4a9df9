//! Hashing - SHA-256 Content Hashes for Build Stats
//!
//! A compilation's stats carry a content hash per emitted asset so two runs
//! over identical inputs are verifiably identical.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// First eight hex characters, for log lines.
pub fn short_hash(data: &[u8]) -> String {
    let mut full = sha256_hex(data);
    full.truncate(8);
    full
}

// We need hex encoding
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"asset contents";
        let h1 = sha256_hex(data);
        let h2 = sha256_hex(data);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_short_hash_is_prefix() {
        let data = b"asset contents";
        let full = sha256_hex(data);
        let short = short_hash(data);
        assert_eq!(short.len(), 8);
        assert!(full.starts_with(&short));
    }

    #[test]
    fn test_distinct_content_distinct_hash() {
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}
