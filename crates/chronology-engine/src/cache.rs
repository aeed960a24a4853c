//! Key-value cache for page texts and compressed tables
//!
//! Reading a large scanned document is by far the slowest step, so page
//! texts and compressed results are kept between runs under keys derived
//! from the source content identifier and the query parameters.

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::config::ChronologyConfig;
use crate::filter::Filter;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache key '{0}': must be a simple name")]
    InvalidKey(String),

    #[error("Cache IO error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache entry '{key}' could not be decoded: {reason}")]
    Encoding { key: String, reason: String },
}

/// Swappable blob store
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// Keys are plain file names, never paths
pub fn check_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key == "." || key == ".." {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// One file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, CacheError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| CacheError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        check_key(key)?;
        let path = self.root.join(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(|source| CacheError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        check_key(key)?;
        fs::write(self.root.join(key), value).map_err(|source| CacheError::Io {
            key: key.to_string(),
            source,
        })
    }
}

/// In-process store, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        check_key(key)?;
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        check_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Load a JSON-encoded entry
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    let Some(bytes) = store.load(key)? else {
        debug!(key, "cache miss");
        return Ok(None);
    };
    debug!(key, "cache hit");
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CacheError::Encoding {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Save an entry as JSON
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Encoding {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.save(key, &bytes)
}

/// Cache key naming
pub struct CacheKeys;

impl CacheKeys {
    pub fn pages(content_id: &str) -> String {
        format!("pages-{}.json", content_id)
    }

    /// Key of a compressed table: source content, query and heuristics
    pub fn compressed(content_id: &str, filter: &Filter, config: &ChronologyConfig) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content_id.as_bytes());
        hasher.update(b"\n");
        hasher.update(serde_json::to_vec(filter).unwrap_or_default());
        hasher.update(b"\n");
        hasher.update(Self::config_fingerprint(config).as_bytes());
        format!("compressed-{}.csv", hex::encode(hasher.finalize()))
    }

    fn config_fingerprint(config: &ChronologyConfig) -> String {
        // cache_dir does not influence results
        format!(
            "{}|{}|{}|{}|{}",
            config.header_pages_to_skip,
            config.page_boilerplate_pattern,
            config.lot_prefix,
            config.section_titles.join("\u{1f}"),
            config.max_distance_percent
        )
    }
}
