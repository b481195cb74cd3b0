//! Stable section identifiers.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

const ID_PREFIX: &str = "section_";

/// Identifier for a heading: `section_` + the first 8 bytes of
/// SHA-256(title ++ level), hex-encoded.
pub fn section_id(level: u8, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(level.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(ID_PREFIX.len() + 16);
    id.push_str(ID_PREFIX);
    for byte in &digest[..8] {
        id.push_str(&format!("{:02x}", byte));
    }
    id
}

/// Hands out unique IDs across one document.
///
/// The first heading with a given (title, level) gets the bare ID, the k-th
/// repeat gets `_k` appended.
#[derive(Debug, Default)]
pub struct IdAllocator {
    seen: HashMap<String, usize>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, level: u8, title: &str) -> String {
        let base = section_id(level, title);
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            base
        } else {
            format!("{}_{}", base, count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_shape() {
        let id = section_id(1, "Introduction");
        assert!(id.starts_with("section_"));
        assert_eq!(id.len(), "section_".len() + 16);
        assert!(id["section_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_section_id_deterministic() {
        assert_eq!(section_id(2, "Setup"), section_id(2, "Setup"));
    }

    #[test]
    fn test_level_changes_id() {
        assert_ne!(section_id(1, "Setup"), section_id(2, "Setup"));
    }

    #[test]
    fn test_known_digest() {
        let digest = Sha256::digest(b"a1");
        let expected: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(section_id(1, "a"), format!("section_{}", expected));
    }

    #[test]
    fn test_allocator_suffixes_repeats() {
        let mut ids = IdAllocator::new();
        let first = ids.allocate(2, "Usage");
        let second = ids.allocate(2, "Usage");
        let third = ids.allocate(2, "Usage");
        let other_level = ids.allocate(3, "Usage");

        assert_eq!(first, section_id(2, "Usage"));
        assert_eq!(second, format!("{}_2", first));
        assert_eq!(third, format!("{}_3", first));
        assert_eq!(other_level, section_id(3, "Usage"));
    }
}
