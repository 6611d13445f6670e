//! Content fingerprint for duplicate detection.
//!
//! FNV-1a over the truncated request followed by the truncated response.
//! Stable across processes and builds, unlike `DefaultHasher`. Not a
//! cryptographic digest.

use super::text::{truncate_chars, MAX_REQUEST_CHARS, MAX_RESPONSE_CHARS};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Digest of a truncated interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint an interaction. Text past the truncation limits is ignored.
    pub fn of_interaction(request: &str, response: &str) -> Self {
        let request = truncate_chars(request, MAX_REQUEST_CHARS);
        let response = truncate_chars(response, MAX_RESPONSE_CHARS);

        let mut hash = FNV_OFFSET_BASIS;
        for byte in request.bytes().chain(response.bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        Self(hash)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
