//! Key-value persistence contract and backends
//!
//! This module defines the [`KeyValueStore`] contract the application state is
//! built on: an async, string-keyed, string-valued store that survives process
//! restarts. Two backends live here, a sled-backed store for devices and an
//! in-memory store for tests and ephemeral sessions. A JSON-file backend lives
//! in [`crate::file`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Separator used when joining scoped keys
pub const KEY_SEPARATOR: &str = ":";

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are not valid UTF-8 text
    #[error("Invalid value for key {0}")]
    InvalidValue(String),

    /// Corruption detected in a persisted document
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Persisted document was written by a different schema version
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Durable string key-value store
///
/// Every method is async so backends are free to hit disk. `remove` on an
/// absent key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Join key segments with [`KEY_SEPARATOR`] (e.g. `["device", "theme"]` -> `device:theme`)
pub fn scoped_key(scopes: &[&str]) -> String {
    scopes.join(KEY_SEPARATOR)
}

/// Read and deserialize a JSON value
pub async fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize a value as JSON and store it
pub async fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

/// Sled store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for immediate flush)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "campus_guide_kv.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Sled-backed key-value store
#[derive(Clone)]
pub struct SledKvStore {
    db: Arc<Db>,
}

impl SledKvStore {
    /// Open (or create) a store with configuration
    pub fn open(config: &KvConfig) -> Result<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .flush_every_ms(config.flush_every_ms)
            .open()?;
        tracing::debug!(path = %config.path, "opened sled key-value store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary store that is deleted on drop (for testing)
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SledKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| KvError::InvalidValue(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }
}

/// In-memory key-value store
///
/// Nothing survives the process. Cloning shares the underlying map, which lets
/// tests simulate an app restart by building new stores over the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        count: i32,
    }

    #[tokio::test]
    async fn test_sled_store_creation() {
        let kv = SledKvStore::temporary().unwrap();
        assert_eq!(kv.get("auth:users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let kv = SledKvStore::temporary().unwrap();

        kv.set("test_key", "test_value").await.unwrap();

        let value = kv.get("test_key").await.unwrap();
        assert_eq!(value, Some("test_value".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let kv = SledKvStore::temporary().unwrap();
        assert_eq!(kv.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let kv = SledKvStore::temporary().unwrap();

        kv.set("key", "value").await.unwrap();
        kv.remove("key").await.unwrap();
        assert_eq!(kv.get("key").await.unwrap(), None);

        kv.remove("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let kv = SledKvStore::temporary().unwrap();
        let data = TestData { name: "Alice".to_string(), count: 42 };

        set_json(&kv, "user", &data).await.unwrap();

        let retrieved: Option<TestData> = get_json(&kv, "user").await.unwrap();
        assert_eq!(retrieved, Some(data));
    }

    #[tokio::test]
    async fn test_get_json_reports_corrupt_value() {
        let kv = MemoryKvStore::new();
        kv.set("user", "{not json").await.unwrap();

        let result: Result<Option<TestData>> = get_json(&kv, "user").await;
        assert!(matches!(result, Err(KvError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_sled_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        let config = KvConfig::new(path.to_string_lossy()).flush_every_ms(None);

        {
            let kv = SledKvStore::open(&config).unwrap();
            kv.set("auth:session", "{}").await.unwrap();
            kv.flush().unwrap();
        }

        let kv = SledKvStore::open(&config).unwrap();
        assert_eq!(kv.get("auth:session").await.unwrap(), Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_data() {
        let kv = MemoryKvStore::new();
        let other = kv.clone();

        kv.set("key", "value").await.unwrap();
        assert_eq!(other.get("key").await.unwrap(), Some("value".to_string()));
        assert_eq!(other.len().await, 1);

        other.remove("key").await.unwrap();
        assert!(kv.is_empty().await);
    }

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key(&["device", "theme"]), "device:theme");
        assert_eq!(scoped_key(&["favourites", "a@b.co"]), "favourites:a@b.co");
    }

    #[test]
    fn test_config_builder() {
        let config = KvConfig::new("test.db")
            .cache_capacity(32 * 1024 * 1024)
            .use_compression(false)
            .flush_every_ms(Some(1000));

        assert_eq!(config.path, "test.db");
        assert_eq!(config.cache_capacity, 32 * 1024 * 1024);
        assert!(!config.use_compression);
        assert_eq!(config.flush_every_ms, Some(1000));
    }
}
