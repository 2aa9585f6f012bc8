//! Cache key computation for the wheel store
//!
//! Keys are content-addressed: a deterministic digest over the combined
//! bytes of the dependency manifests, namespaced by operating system and
//! a fixed token. Identical manifest contents always produce the same
//! key, which is what makes cross-run cache reuse possible.

use crate::error::WheelwrightResult;
use crate::manifest;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Default namespace token for wheel caches
pub const DEFAULT_NAMESPACE: &str = "pip";

/// Number of hex characters kept from the SHA256 digest
const DIGEST_LEN: usize = 16;

/// Content-addressed cache key: `{os}-{namespace}-{digest}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    os: String,
    namespace: String,
    digest: String,
}

impl CacheKey {
    /// Compute the key for a set of manifest files
    pub fn compute(namespace: &str, manifests: &[PathBuf]) -> WheelwrightResult<Self> {
        let bytes = manifest::combined_bytes(manifests)?;
        Ok(Self::from_bytes(namespace, &bytes))
    }

    /// Compute the key directly from manifest bytes
    pub fn from_bytes(namespace: &str, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let result = hasher.finalize();

        Self {
            os: std::env::consts::OS.to_string(),
            namespace: namespace.to_string(),
            digest: hex::encode(&result[..DIGEST_LEN / 2]),
        }
    }

    /// Parse a key back from its rendered form
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.rsplitn(3, '-');
        let digest = parts.next()?;
        let namespace = parts.next()?;
        let os = parts.next()?;

        if digest.len() != DIGEST_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self {
            os: os.to_string(),
            namespace: namespace.to_string(),
            digest: digest.to_string(),
        })
    }

    /// The truncated hex digest component
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The namespace token component
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Restore-key prefix matching any entry for this OS and namespace
    ///
    /// A prefix match is advisory only: the entry it surfaces was built
    /// from different manifest contents and may be stale.
    pub fn restore_prefix(&self) -> String {
        format!("{}-{}-", self.os, self.namespace)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.os, self.namespace, self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn key_is_deterministic() {
        let key1 = CacheKey::from_bytes("pip", b"numpy==1.19.5\n");
        let key2 = CacheKey::from_bytes("pip", b"numpy==1.19.5\n");
        assert_eq!(key1, key2);
        assert_eq!(key1.to_string(), key2.to_string());
    }

    #[test]
    fn key_changes_with_content() {
        let key1 = CacheKey::from_bytes("pip", b"numpy==1.19.5\n");
        let key2 = CacheKey::from_bytes("pip", b"numpy==1.20.0\n");
        assert_ne!(key1.digest(), key2.digest());
    }

    #[test]
    fn key_digest_length() {
        let key = CacheKey::from_bytes("pip", b"anything");
        assert_eq!(key.digest().len(), 16);
    }

    #[test]
    fn compute_matches_from_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("requirements.txt");
        fs::write(&a, "shapely==1.7.1\n").unwrap();
        let b = dir.path().join("requirements-dev.txt");
        fs::write(&b, "flake8==3.8.4\n").unwrap();

        let computed = CacheKey::compute("pip", &[a, b]).unwrap();
        let expected = CacheKey::from_bytes("pip", b"shapely==1.7.1\nflake8==3.8.4\n");
        assert_eq!(computed, expected);
    }

    #[test]
    fn restore_prefix_drops_digest() {
        let key = CacheKey::from_bytes("pip", b"x");
        let prefix = key.restore_prefix();
        assert!(key.to_string().starts_with(&prefix));
        assert!(!prefix.contains(key.digest()));
    }

    #[test]
    fn parse_roundtrip() {
        let key = CacheKey::from_bytes("pip", b"content");
        let parsed = CacheKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(CacheKey::parse("not-a-key").is_none());
        assert!(CacheKey::parse("").is_none());
        assert!(CacheKey::parse("linux-pip-zzzz").is_none());
    }
}
