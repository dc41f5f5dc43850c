// Content hashing for change detection and history integrity checks.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 hash of page content.
pub type ContentHash = String;

/// Compute the SHA-256 hash of the given bytes, returned as a lowercase hex string.
pub fn sha256_hex(content: &[u8]) -> ContentHash {
    let digest = Sha256::digest(content);
    hex_encode(&digest)
}

/// Hash of a page's text. `None` (no content yet) hashes like the empty string.
pub fn content_hash(content: Option<&str>) -> ContentHash {
    sha256_hex(super::normalize(content).as_bytes())
}

/// Case-insensitive comparison against a stored hash. An empty expectation
/// never matches.
pub fn verify_hash(content: Option<&str>, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    content_hash(content).eq_ignore_ascii_case(expected)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
