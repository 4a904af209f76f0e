//! Credential hashing.
//!
//! Digests are deterministic so they can be looked up and compared; the
//! identifier is mixed in so equal secrets never produce equal digests
//! across different logins.

use std::fmt;

use sha2::{Digest, Sha256};

/// Domain separation prefix for credential digests.
const DIGEST_CONTEXT: &[u8] = b"keyward.credential.v1";

/// Hex-encoded SHA-256 credential digest (64 lowercase chars).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a stored digest without short-circuiting on the first
    /// differing byte.
    pub fn matches(&self, stored: &str) -> bool {
        let a = self.0.as_bytes();
        let b = stored.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Display for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash an (identifier, secret) pair.
///
/// The identifier is length-prefixed so `("ab", "c")` and `("a", "bc")` hash
/// differently.
pub fn hash_credential(identifier: &str, secret: &str) -> CredentialDigest {
    let mut hasher = Sha256::new();
    hasher.update(DIGEST_CONTEXT);
    hasher.update((identifier.len() as u64).to_be_bytes());
    hasher.update(identifier.as_bytes());
    hasher.update(secret.as_bytes());
    CredentialDigest(format!("{:x}", hasher.finalize()))
}
