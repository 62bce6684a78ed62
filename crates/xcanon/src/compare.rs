//! Canonical output comparison
//!
//! Thin comparator over canonical byte sequences. Byte equality is the
//! ground truth; the checksum exists for reporting. A mismatch is a result,
//! not an error — only the CLI treats it as fatal.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a canonical byte sequence.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Exact byte-sequence equality of two canonical outputs.
pub fn compare(a: &[u8], b: &[u8]) -> bool {
    a == b
}
