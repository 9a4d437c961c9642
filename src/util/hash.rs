//! Hashing utilities for commit identifiers.

use sha2::{Digest, Sha256};

/// A hasher for building identifiers from multiple components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0"); // Separator
        self
    }

    /// Finalize and return a short hex fingerprint (first 12 chars).
    pub fn finish_short(self) -> String {
        let mut hex = hex::encode(self.hasher.finalize());
        hex.truncate(12);
        hex
    }
}
