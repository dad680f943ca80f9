//! Disk cache for downloaded release archives.
//!
//! Archives are memoized under `owner-repo-version.ext` style keys in the
//! user cache directory, bounded by a byte budget from the config. When the
//! budget would be exceeded the archive simply is not cached; there is no
//! eviction beyond `purge`.

use crate::FetchResult;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArchiveCache {
    dir: PathBuf,
    size_limit: u64,
}

/// Build a cache key from its parts, flattening path and timestamp
/// separators so the key is a plain filename.
pub fn archive_key(owner: &str, repo_name: &str, version: &str, ext: &str) -> String {
    format!("{owner}-{repo_name}-{version}{ext}").replace(['/', ':', '\\'], "-")
}

impl ArchiveCache {
    /// Open (and create) the cache directory. A zero byte budget disables
    /// caching entirely and clears anything already stored.
    pub fn open(dir: PathBuf, size_limit: u64) -> FetchResult<Option<ArchiveCache>> {
        if size_limit == 0 {
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
                log::info!("cache disabled; purged {}", dir.display());
            }
            return Ok(None);
        }
        fs::create_dir_all(&dir)?;
        Ok(Some(ArchiveCache { dir, size_limit }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a cached archive, if present.
    pub fn get(&self, key: &str) -> Option<PathBuf> {
        let path = self.dir.join(key);
        path.is_file().then_some(path)
    }

    /// Store an archive under `key`. Returns false (without copying) when the
    /// addition would exceed the byte budget.
    pub fn put(&self, key: &str, source: &Path) -> FetchResult<bool> {
        let incoming = fs::metadata(source)?.len();
        if self.volume()? + incoming > self.size_limit {
            log::info!("cache full, not caching this archive");
            return Ok(false);
        }
        fs::copy(source, self.dir.join(key))?;
        Ok(true)
    }

    /// Total bytes currently stored.
    pub fn volume(&self) -> FetchResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }

    /// Delete every cached archive.
    pub fn purge(&self) -> FetchResult<()> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_flattened_to_filenames() {
        assert_eq!(
            archive_key("rsms", "inter", "v4.0", ".zip"),
            "rsms-inter-v4.0.zip"
        );
        assert_eq!(
            archive_key("google-fonts", "ofl/roboto", "2024-03-01T12:00:00Z", ".zip"),
            "google-fonts-ofl-roboto-2024-03-01T12-00-00Z.zip"
        );
    }

    #[test]
    fn stores_and_retrieves_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.zip");
        std::fs::write(&source, b"0123456789").unwrap();

        let cache = ArchiveCache::open(dir.path().join("cache"), 1024)
            .unwrap()
            .unwrap();
        assert!(cache.get("k.zip").is_none());
        assert!(cache.put("k.zip", &source).unwrap());
        let cached = cache.get("k.zip").unwrap();
        assert_eq!(std::fs::read(cached).unwrap(), b"0123456789");
        assert_eq!(cache.volume().unwrap(), 10);
    }

    #[test]
    fn refuses_to_exceed_the_budget() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.zip");
        std::fs::write(&source, vec![0u8; 64]).unwrap();

        let cache = ArchiveCache::open(dir.path().join("cache"), 100)
            .unwrap()
            .unwrap();
        assert!(cache.put("first.zip", &source).unwrap());
        assert!(!cache.put("second.zip", &source).unwrap());
        assert!(cache.get("second.zip").is_none());
    }

    #[test]
    fn zero_budget_disables_and_purges() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("old.zip"), b"stale").unwrap();

        assert!(ArchiveCache::open(cache_dir.clone(), 0).unwrap().is_none());
        assert!(!cache_dir.exists());
    }

    #[test]
    fn purge_empties_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.zip");
        std::fs::write(&source, b"data").unwrap();
        let cache = ArchiveCache::open(dir.path().join("cache"), 1024)
            .unwrap()
            .unwrap();
        cache.put("k.zip", &source).unwrap();
        cache.purge().unwrap();
        assert_eq!(cache.volume().unwrap(), 0);
    }
}
