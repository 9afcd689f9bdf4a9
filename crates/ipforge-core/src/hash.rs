//! Content fingerprints for assembled descriptors.
//!
//! A fingerprint is the SHA-256 of a value's canonical JSON encoding. Two
//! peripherals assembled from the same declarations carry the same
//! fingerprint, which lets emitters skip regeneration of unchanged output.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A SHA-256 digest in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest raw bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Fingerprint(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Digest the JSON encoding of `value`.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::of_bytes(&serde_json::to_vec(value)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex digits, for compact listings.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub fn matches<T: Serialize>(&self, value: &T) -> bool {
        Self::of(value).map(|f| f == *self).unwrap_or(false)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
