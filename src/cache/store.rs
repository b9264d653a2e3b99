// Cache store for memoizing results on disk.
// Handles JSON serialization, corruption policy, and atomic writes.

use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// What to do when a cache file exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnCorruption {
    /// Surface `BotError::CacheCorrupt` and stop.
    #[default]
    Fail,
    /// Log a warning, recompute, and overwrite the file.
    Recompute,
}

/// Read cached JSON data from a file.
///
/// A missing file is `Ok(None)`; a file that exists but does not decode is
/// `BotError::CacheCorrupt`.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| BotError::CacheCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Write data to cache as JSON.
pub fn write_cached<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let cached = CachedData::new(data);
    let json = serde_json::to_string(&cached)?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Look up a cached value, applying the corruption policy.
fn lookup<T: DeserializeOwned>(path: &Path, policy: OnCorruption) -> Result<Option<T>> {
    match read_cached::<T>(path) {
        Ok(Some(cached)) => {
            debug!(path = %path.display(), cached_at = %cached.cached_at, "cache hit");
            Ok(Some(cached.data))
        }
        Ok(None) => {
            info!(path = %path.display(), "cache miss");
            Ok(None)
        }
        Err(BotError::CacheCorrupt { path, reason }) if policy == OnCorruption::Recompute => {
            warn!(path = %path.display(), %reason, "corrupt cache entry, recomputing");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Return the value persisted at `path`, or compute, persist, and return it.
pub fn cache_result<T, F>(path: &Path, policy: OnCorruption, compute: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    if let Some(data) = lookup(path, policy)? {
        return Ok(data);
    }

    let data = compute()?;
    write_cached(path, &data)?;
    Ok(data)
}

/// Async counterpart of [`cache_result`] for values produced by network fetches.
pub async fn cache_result_async<T, F, Fut>(path: &Path, policy: OnCorruption, fetch: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(data) = lookup(path, policy)? {
        return Ok(data);
    }

    let data = fetch().await?;
    write_cached(path, &data)?;
    Ok(data)
}

/// A cache directory with a fixed corruption policy.
///
/// Keys are anything path-like and resolve relative to the directory, so each
/// distinct key maps to exactly one file.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    policy: OnCorruption,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, policy: OnCorruption) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a key to its backing file.
    pub fn path_for<K: AsRef<Path>>(&self, key: K) -> PathBuf {
        self.dir.join(key)
    }

    pub fn get_or_compute<K, T, F>(&self, key: K, compute: F) -> Result<T>
    where
        K: AsRef<Path>,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        cache_result(&self.path_for(key), self.policy, compute)
    }

    pub async fn get_or_fetch<K, T, F, Fut>(&self, key: K, fetch: F) -> Result<T>
    where
        K: AsRef<Path>,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        cache_result_async(&self.path_for(key), self.policy, fetch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_and_read_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_cached(&path, &data).unwrap();

        let cached: Option<CachedData<TestData>> = read_cached(&path).unwrap();
        assert_eq!(cached.unwrap().data, data);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let cached: Option<CachedData<TestData>> = read_cached(&path).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_cache_result_computes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("neighbors.json");
        let calls = Cell::new(0);

        let compute = || {
            calls.set(calls.get() + 1);
            let mut map = BTreeMap::new();
            map.insert(0usize, vec![1usize, 2]);
            map.insert(1, vec![0]);
            Ok(map)
        };

        let first: BTreeMap<usize, Vec<usize>> =
            cache_result(&path, OnCorruption::Fail, compute).unwrap();
        let second: BTreeMap<usize, Vec<usize>> =
            cache_result(&path, OnCorruption::Fail, compute).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compute_error_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("failing.json");

        let result: Result<TestData> = cache_result(&path, OnCorruption::Fail, || {
            Err(BotError::GeodataMiss("Alpine County".to_string()))
        });

        assert!(matches!(result, Err(BotError::GeodataMiss(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_entry_is_fatal_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counties.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<TestData> = cache_result(&path, OnCorruption::Fail, || {
            Err(BotError::Render("recomputed".to_string()))
        });

        match result {
            Err(BotError::CacheCorrupt { path: bad, .. }) => assert_eq!(bad, path),
            other => panic!("expected CacheCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_entry_recomputes_when_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path(), OnCorruption::Recompute);
        fs::write(cache.path_for("data.json"), "[1, 2").unwrap();

        let data = TestData {
            name: "fresh".to_string(),
            value: 7,
        };
        let got = cache
            .get_or_compute("data.json", || Ok(data.clone()))
            .unwrap();
        assert_eq!(got, data);

        // The repaired file is now served without recomputation.
        let again: TestData = cache
            .get_or_compute("data.json", || Err(BotError::Render("recomputed".to_string())))
            .unwrap();
        assert_eq!(again, data);
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path(), OnCorruption::Fail);

        let first: Vec<String> = cache
            .get_or_fetch("names.json", || async {
                Ok(vec!["Alameda".to_string(), "Alpine".to_string()])
            })
            .await
            .unwrap();

        let second: Vec<String> = cache
            .get_or_fetch("names.json", || async {
                Err(BotError::Render("refetched".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
