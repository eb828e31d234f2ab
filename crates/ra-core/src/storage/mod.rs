//! Storage port for saved pages, partitioned by owner name.

use std::fmt::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Result;

pub mod memory;

/// A saved link and the display name of the user who sent it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub owner_name: String,
}

impl Page {
    pub fn new(url: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            owner_name: owner_name.into(),
        }
    }

    /// Deterministic content address of `(url, owner_name)`, lowercase hex SHA-256.
    pub fn hash(&self) -> String {
        content_hash(&[self.url.as_str(), self.owner_name.as_str()])
    }
}

/// Lowercase hex SHA-256 over the concatenation of `parts`.
pub fn content_hash(parts: &[&str]) -> String {
    let mut h = Sha256::new();
    for part in parts {
        h.update(part.as_bytes());
    }
    hex(&h.finalize())
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Contract every backend implements.
///
/// `save` does not deduplicate; callers check `is_exists` first. None of the
/// operations are transactional with each other.
#[async_trait]
pub trait Storage: Send + Sync {
    /// One-time bootstrap (schema creation, connectivity check). Idempotent.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn save(&self, page: &Page) -> Result<()>;

    /// A randomly chosen page of `owner_name`, or `None` when they have none saved.
    async fn pick_random(&self, owner_name: &str) -> Result<Option<Page>>;

    /// Removing a page that is not stored is not an error.
    async fn remove(&self, page: &Page) -> Result<()>;

    async fn is_exists(&self, page: &Page) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_owner_sensitive() {
        let a = Page::new("https://example.com/a", "Alice");
        assert_eq!(a.hash(), a.clone().hash());
        assert_eq!(a.hash().len(), 64);
        assert!(a.hash().chars().all(|c| c.is_ascii_hexdigit()));

        let b = Page::new("https://example.com/a", "Bob");
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn hash_matches_known_digest() {
        // sha256("") with both fields empty.
        let p = Page::new("", "");
        assert_eq!(
            p.hash(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
