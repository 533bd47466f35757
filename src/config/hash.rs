//! Fingerprints of rendered configuration.
//!
//! Plans carry a fingerprint of the exact command sequence they will send;
//! drift reports carry order-independent fingerprints of the desired and
//! observed statements so equal content hashes equally.

use sha2::{Digest, Sha256};

use crate::codec::CommandSet;

/// Hasher for command sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hashes the lines in order.
    #[must_use]
    pub fn hash_sequence(&self, lines: &CommandSet) -> String {
        let mut hasher = Sha256::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Hashes the set of distinct lines, ignoring order.
    #[must_use]
    pub fn hash_lines<'a, I>(&self, lines: I) -> String
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut sorted: Vec<&str> = lines.into_iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = Sha256::new();
        for line in sorted {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(lines: &[&str]) -> CommandSet {
        let mut set = CommandSet::new();
        for line in lines {
            set.set(line);
        }
        set
    }

    #[test]
    fn test_sequence_hash_is_order_sensitive() {
        let hasher = ConfigHasher::new();
        let a = commands(&["system host-name r1", "system domain-name lab"]);
        let b = commands(&["system domain-name lab", "system host-name r1"]);

        assert_eq!(hasher.hash_sequence(&a), hasher.hash_sequence(&a));
        assert_ne!(hasher.hash_sequence(&a), hasher.hash_sequence(&b));
    }

    #[test]
    fn test_line_hash_ignores_order_and_duplicates() {
        let hasher = ConfigHasher::new();
        let a = commands(&["system host-name r1", "system domain-name lab"]);
        let b = commands(&[
            "system domain-name lab",
            "system host-name r1",
            "system host-name r1",
        ]);

        assert_eq!(hasher.hash_lines(&a), hasher.hash_lines(&b));
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
    }
}
