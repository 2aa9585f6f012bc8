//! Persistent wheel store
//!
//! A key-value store mapping cache keys to directories of prebuilt wheel
//! artifacts. Entries are write-once: publishing happens by atomic rename
//! from a staging directory, and an existing entry is never overwritten.
//! New manifest contents hash to a new key and therefore a new entry.

use crate::cache::key::CacheKey;
use crate::error::{WheelwrightError, WheelwrightResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Marker file distinguishing a published entry from a crashed build
const META_FILE: &str = ".entry.json";

/// A published cache entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key this entry was published under
    pub key: CacheKey,
    /// Directory holding the wheel artifacts
    pub path: PathBuf,
    /// When the entry was published
    pub created_at: DateTime<Utc>,
    /// Number of wheel files in the entry
    pub wheel_count: usize,
    /// Total size of the entry in bytes
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Check if this entry is older than the given number of days
    pub fn is_older_than_days(&self, days: u32) -> bool {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        self.created_at < cutoff
    }
}

/// Entry metadata persisted alongside the wheels
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    created_at: DateTime<Utc>,
}

/// Abstract wheel store interface
///
/// The filesystem implementation below is the production store; tests
/// substitute it with a store rooted in a temporary directory.
#[async_trait]
pub trait WheelStore: Send + Sync {
    /// Look up the entry for an exact key
    async fn get(&self, key: &CacheKey) -> WheelwrightResult<Option<CacheEntry>>;

    /// Publish a staged artifact directory under a key
    ///
    /// If the key was published concurrently by another run, the staged
    /// directory is discarded and the existing entry wins.
    async fn put(&self, key: &CacheKey, staged: &Path) -> WheelwrightResult<CacheEntry>;

    /// Best-effort lookup of the most recent entry matching a key prefix
    async fn get_by_prefix(&self, prefix: &str) -> WheelwrightResult<Option<CacheEntry>>;

    /// List all published entries
    async fn list(&self) -> WheelwrightResult<Vec<CacheEntry>>;

    /// Remove the entry for a key
    async fn remove(&self, key: &CacheKey) -> WheelwrightResult<()>;

    /// Allocate a fresh writable staging directory
    async fn staging_dir(&self) -> WheelwrightResult<PathBuf>;
}

/// Filesystem-backed wheel store
///
/// Layout: one directory per key under the root, each holding the wheel
/// files plus a small metadata marker. Builds in flight live under
/// `.staging/` until published.
pub struct FsWheelStore {
    root: PathBuf,
}

impl FsWheelStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.to_string())
    }

    async fn ensure_root(&self) -> WheelwrightResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| WheelwrightError::io(format!("creating cache root {}", self.root.display()), e))
    }

    async fn read_entry(&self, dir: &Path) -> WheelwrightResult<Option<CacheEntry>> {
        let meta_path = dir.join(META_FILE);
        let content = match fs::read_to_string(&meta_path).await {
            Ok(c) => c,
            // No marker: an unfinished build from a crashed run, not an entry
            Err(_) => return Ok(None),
        };

        let meta: EntryMeta = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                warn!("Ignoring cache entry with corrupt metadata: {}", e);
                return Ok(None);
            }
        };
        let key = match CacheKey::parse(&meta.key) {
            Some(k) => k,
            None => {
                warn!("Ignoring cache entry with malformed key: {}", meta.key);
                return Ok(None);
            }
        };

        let (wheel_count, size_bytes) = dir_stats(dir).await?;

        Ok(Some(CacheEntry {
            key,
            path: dir.to_path_buf(),
            created_at: meta.created_at,
            wheel_count,
            size_bytes,
        }))
    }
}

/// Count wheel files and total bytes in an entry directory
async fn dir_stats(dir: &Path) -> WheelwrightResult<(usize, u64)> {
    let mut wheel_count = 0;
    let mut size_bytes = 0;

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| WheelwrightError::io(format!("reading cache entry {}", dir.display()), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| WheelwrightError::io("iterating cache entry", e))?
    {
        let meta = entry
            .metadata()
            .await
            .map_err(|e| WheelwrightError::io("reading cache file metadata", e))?;
        if meta.is_file() {
            size_bytes += meta.len();
            if entry.path().extension().is_some_and(|e| e == "whl") {
                wheel_count += 1;
            }
        }
    }

    Ok((wheel_count, size_bytes))
}

#[async_trait]
impl WheelStore for FsWheelStore {
    async fn get(&self, key: &CacheKey) -> WheelwrightResult<Option<CacheEntry>> {
        let dir = self.entry_dir(key);
        if !dir.exists() {
            return Ok(None);
        }
        self.read_entry(&dir).await
    }

    async fn put(&self, key: &CacheKey, staged: &Path) -> WheelwrightResult<CacheEntry> {
        self.ensure_root().await?;
        let dir = self.entry_dir(key);

        // Entries are immutable: a concurrent publisher wins, our build
        // is discarded.
        if let Some(existing) = self.get(key).await? {
            debug!("Entry {} already published, discarding staged build", key);
            let _ = fs::remove_dir_all(staged).await;
            return Ok(existing);
        }

        // A directory without a metadata marker is a crashed build;
        // clear it so the rename can land.
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| WheelwrightError::io(format!("clearing stale entry {}", dir.display()), e))?;
        }

        let meta = EntryMeta {
            key: key.to_string(),
            created_at: Utc::now(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)?;
        fs::write(staged.join(META_FILE), meta_json)
            .await
            .map_err(|e| WheelwrightError::io("writing cache entry metadata", e))?;

        fs::rename(staged, &dir).await.map_err(|e| {
            WheelwrightError::io(format!("publishing cache entry {}", dir.display()), e)
        })?;

        info!("Published cache entry {}", key);

        self.read_entry(&dir).await?.ok_or_else(|| WheelwrightError::CacheEntry {
            key: key.to_string(),
            reason: "entry vanished after publish".to_string(),
        })
    }

    async fn get_by_prefix(&self, prefix: &str) -> WheelwrightResult<Option<CacheEntry>> {
        let mut best: Option<CacheEntry> = None;
        for entry in self.list().await? {
            if !entry.key.to_string().starts_with(prefix) {
                continue;
            }
            let newer = best
                .as_ref()
                .map(|b| entry.created_at > b.created_at)
                .unwrap_or(true);
            if newer {
                best = Some(entry);
            }
        }
        Ok(best)
    }

    async fn list(&self) -> WheelwrightResult<Vec<CacheEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut result = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| WheelwrightError::io(format!("reading cache root {}", self.root.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WheelwrightError::io("iterating cache root", e))?
        {
            let path = entry.path();
            if !path.is_dir() || path.file_name().is_some_and(|n| n == ".staging") {
                continue;
            }
            if let Some(cache_entry) = self.read_entry(&path).await? {
                result.push(cache_entry);
            }
        }

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn remove(&self, key: &CacheKey) -> WheelwrightResult<()> {
        let dir = self.entry_dir(key);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| WheelwrightError::io(format!("removing cache entry {}", dir.display()), e))?;
            info!("Removed cache entry {}", key);
        }
        Ok(())
    }

    async fn staging_dir(&self) -> WheelwrightResult<PathBuf> {
        let staging = self
            .root
            .join(".staging")
            .join(uuid::Uuid::new_v4().simple().to_string());
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| WheelwrightError::io(format!("creating staging dir {}", staging.display()), e))?;
        Ok(staging)
    }
}
