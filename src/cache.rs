//! File-based cache for the remote datasets
//!
//! Both inputs are plain files published over HTTPS. They are stored under
//! `{data_dir}/cache/` and reused while younger than the configured TTL.
//! Freshness is taken from the file modification time.
//!
//! When a refresh fails and an older copy exists, the older copy is used and
//! a warning is logged. Only when there is nothing on disk does the fetch
//! error reach the caller.

use crate::error::BlocklensError;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Default TTL for cached datasets (24 hours)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Datasets kept in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    /// Provider IP ranges document
    IpRanges,
    /// Blocked address list
    Blocklist,
}

impl DataFile {
    pub fn all() -> Vec<DataFile> {
        vec![DataFile::IpRanges, DataFile::Blocklist]
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DataFile::IpRanges => "ip-ranges.json",
            DataFile::Blocklist => "ips.txt",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataFile::IpRanges => "ip-ranges",
            DataFile::Blocklist => "blocklist",
        }
    }
}

impl std::fmt::Display for DataFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Information about one cached file
#[derive(Debug, Clone, Serialize)]
pub struct CachedFileInfo {
    pub name: String,
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<u64>,
}

/// Cache manager for the dataset files
pub struct DataFileCache {
    cache_dir: PathBuf,
}

impl DataFileCache {
    /// Create the cache, making sure `{data_dir}/cache` exists
    pub fn new(data_dir: &str) -> Result<Self> {
        let cache_dir = PathBuf::from(data_dir).join("cache");
        fs::create_dir_all(&cache_dir).map_err(|e| BlocklensError::Cache {
            path: cache_dir.clone(),
            source: e,
        })?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache file path for a dataset
    pub fn path(&self, file: DataFile) -> PathBuf {
        self.cache_dir.join(file.file_name())
    }

    /// Age of the cached file, `None` when missing
    pub fn age(&self, file: DataFile) -> Option<Duration> {
        let modified = fs::metadata(self.path(file)).ok()?.modified().ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Whether the cached copy can be used without refetching.
    ///
    /// A zero TTL never expires: the file is fetched once and kept.
    pub fn is_fresh(&self, file: DataFile, ttl: Duration) -> bool {
        match self.age(file) {
            None => false,
            Some(_) if ttl.is_zero() => true,
            Some(age) => age < ttl,
        }
    }

    /// Return a usable local path for `file`, fetching `url` when needed
    pub fn ensure(
        &self,
        file: DataFile,
        url: &str,
        ttl: Duration,
        force: bool,
    ) -> Result<PathBuf> {
        let path = self.path(file);

        if !force && self.is_fresh(file, ttl) {
            info!("using cached {} at {:?}", file, path);
            return Ok(path);
        }

        match self.fetch(file, url) {
            Ok(path) => Ok(path),
            Err(e) if path.exists() => {
                warn!("refreshing {} failed ({}), using stale cache {:?}", file, e, path);
                Ok(path)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch `url` and replace the cached copy of `file`
    pub fn fetch(&self, file: DataFile, url: &str) -> Result<PathBuf> {
        info!("downloading {} from {}", file, url);
        let content = oneio::read_to_string(url).map_err(|e| BlocklensError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let path = self.path(file);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|e| BlocklensError::Cache {
            path: tmp_path.clone(),
            source: e,
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| BlocklensError::Cache {
            path: path.clone(),
            source: e,
        })?;

        info!("cached {} to {:?}", file, path);
        Ok(path)
    }

    /// Describe every dataset file
    pub fn list(&self) -> Vec<CachedFileInfo> {
        DataFile::all()
            .into_iter()
            .map(|file| {
                let path = self.path(file);
                let size_bytes = fs::metadata(&path).ok().map(|m| m.len());
                CachedFileInfo {
                    name: file.name().to_string(),
                    path: path.to_string_lossy().to_string(),
                    exists: size_bytes.is_some(),
                    size_bytes,
                    age_secs: self.age(file).map(|a| a.as_secs()),
                }
            })
            .collect()
    }

    /// Remove every cached dataset file
    pub fn clear(&self) -> Result<()> {
        for file in DataFile::all() {
            let path = self.path(file);
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| anyhow!("Failed to remove cache file {:?}: {}", path, e))?;
            }
        }
        Ok(())
    }
}

/// Get the total size of the cache directory
pub fn cache_size(data_dir: &str) -> Result<u64> {
    let cache_base = PathBuf::from(data_dir).join("cache");
    let mut total = 0u64;

    if cache_base.exists() {
        for entry in fs::read_dir(&cache_base)?.flatten() {
            let path = entry.path();
            if path.is_file() {
                total += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            }
        }
    }

    Ok(total)
}
