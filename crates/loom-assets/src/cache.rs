//! Content-addressed asset cache.
//!
//! The cache is an explicit handle passed to each run. An in-memory cache
//! lives as long as its handles; a disk cache persists across runs under a
//! directory of `<fingerprint>.<ext>` files.
//!
//! Disk writes go to a unique temporary file that is renamed into place, so
//! an entry is either complete or absent. Temporaries left behind by an
//! interrupted run are swept when the cache is opened.

use crate::payload::{AssetFormat, Fingerprint};
use loom_core::AssetError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const TMP_MARKER: &str = ".loomtmp.";

#[derive(Debug, Clone)]
enum Entry {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

#[derive(Debug)]
struct CacheInner {
    root: Option<PathBuf>,
    entries: RwLock<HashMap<Fingerprint, Entry>>,
    tmp_counter: AtomicU64,
}

/// Cloneable, thread-safe handle to an asset cache.
#[derive(Debug, Clone)]
pub struct AssetCache {
    inner: Arc<CacheInner>,
}

impl AssetCache {
    /// A cache that keeps payloads in memory.
    pub fn in_memory() -> Self {
        Self::with_root(None, HashMap::new())
    }

    /// Open (or create) a disk cache rooted at `dir`.
    ///
    /// Existing entries are indexed and stale temporary files are removed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AssetError> {
        let root = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|source| cache_error(&root, source))?;

        let mut entries = HashMap::new();
        let mut swept = 0usize;

        for dir_entry in std::fs::read_dir(&root).map_err(|source| cache_error(&root, source))? {
            let dir_entry = dir_entry.map_err(|source| cache_error(&root, source))?;
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if name.contains(TMP_MARKER) {
                match std::fs::remove_file(&path) {
                    Ok(()) => swept += 1,
                    Err(err) => warn!(path = %path.display(), error = %err, "failed to remove stale temp file"),
                }
                continue;
            }

            let indexed = name
                .split_once('.')
                .filter(|(_, ext)| AssetFormat::from_extension(ext).is_some())
                .and_then(|(stem, _)| Fingerprint::parse(stem));
            if let Some(fingerprint) = indexed {
                entries.insert(fingerprint, Entry::Disk(path));
            }
        }

        info!(root = %root.display(), entries = entries.len(), swept, "opened asset cache");
        Ok(Self::with_root(Some(root), entries))
    }

    fn with_root(root: Option<PathBuf>, entries: HashMap<Fingerprint, Entry>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                root,
                entries: RwLock::new(entries),
                tmp_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Directory of a disk cache.
    pub fn root(&self) -> Option<&Path> {
        self.inner.root.as_deref()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.entries.read().contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a payload. Returns the entry's path for a disk cache.
    ///
    /// Storing a fingerprint that is already present is a no-op.
    pub async fn store(
        &self,
        fingerprint: &Fingerprint,
        format: AssetFormat,
        bytes: &[u8],
    ) -> Result<Option<PathBuf>, AssetError> {
        if let Some(entry) = self.inner.entries.read().get(fingerprint) {
            return Ok(match entry {
                Entry::Disk(path) => Some(path.clone()),
                Entry::Memory(_) => None,
            });
        }

        let Some(root) = &self.inner.root else {
            self.inner
                .entries
                .write()
                .insert(fingerprint.clone(), Entry::Memory(Arc::from(bytes)));
            return Ok(None);
        };

        let target = root.join(format!("{}.{}", fingerprint, format.extension()));
        let temp = self.unique_tmp_path(&target);

        if let Err(source) = write_then_rename(&temp, &target, bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(cache_error(&target, source));
        }

        debug!(path = %target.display(), "stored asset");
        self.inner
            .entries
            .write()
            .insert(fingerprint.clone(), Entry::Disk(target.clone()));
        Ok(Some(target))
    }

    /// Read a cached payload.
    pub async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<u8>>, AssetError> {
        let entry = self.inner.entries.read().get(fingerprint).cloned();
        match entry {
            None => Ok(None),
            Some(Entry::Memory(bytes)) => Ok(Some(bytes.to_vec())),
            Some(Entry::Disk(path)) => fs::read(&path)
                .await
                .map(Some)
                .map_err(|source| cache_error(&path, source)),
        }
    }

    fn unique_tmp_path(&self, target: &Path) -> PathBuf {
        let counter = self.inner.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("asset");
        target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
    }
}

async fn write_then_rename(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(temp)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
    }
    fs::rename(temp, target).await
}

fn cache_error(path: &Path, source: std::io::Error) -> AssetError {
    AssetError::Cache { path: path.display().to_string(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::png;

    #[tokio::test]
    async fn test_in_memory_store_and_read() {
        let cache = AssetCache::in_memory();
        let bytes = png(2, 2, 1);
        let fp = Fingerprint::of(&bytes);

        assert_eq!(cache.store(&fp, AssetFormat::Png, &bytes).await.unwrap(), None);
        assert!(cache.contains(&fp));
        assert_eq!(cache.read(&fp).await.unwrap(), Some(bytes));

        let other = cache.clone();
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn test_disk_cache_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = png(2, 2, 7);
        let fp = Fingerprint::of(&bytes);

        let cache = AssetCache::open(dir.path()).unwrap();
        let path = cache.store(&fp, AssetFormat::Png, &bytes).await.unwrap().unwrap();
        assert_eq!(path, dir.path().join(format!("{fp}.png")));
        drop(cache);

        let reopened = AssetCache::open(dir.path()).unwrap();
        assert!(reopened.contains(&fp));
        assert_eq!(reopened.read(&fp).await.unwrap(), Some(bytes));
    }

    #[tokio::test]
    async fn test_open_sweeps_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("abc.png.loomtmp.1.0");
        std::fs::write(&stale, b"partial").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        let cache = AssetCache::open(dir.path()).unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::open(dir.path()).unwrap();
        let bytes = png(3, 3, 9);
        cache.store(&Fingerprint::of(&bytes), AssetFormat::Png, &bytes).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].contains(TMP_MARKER));
    }
}
