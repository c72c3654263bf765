//! JSON-file key-value backend
//!
//! All entries live in one JSON document on disk, wrapped in a versioned
//! envelope with an md5 checksum for corruption detection. Writes go through a
//! temp file and a rename so a crash never leaves a half-written document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::kv::{KeyValueStore, KvError, Result};

/// Versioned document container
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionedDocument {
    version: u32,
    checksum: String,
    entries: BTreeMap<String, String>,
}

impl VersionedDocument {
    fn new(version: u32, entries: BTreeMap<String, String>) -> Result<Self> {
        let checksum = checksum_of(&entries)?;
        Ok(Self { version, checksum, entries })
    }

    fn verify_checksum(&self) -> Result<()> {
        let computed = checksum_of(&self.entries)?;

        if computed != self.checksum {
            return Err(KvError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }

        Ok(())
    }
}

fn checksum_of(entries: &BTreeMap<String, String>) -> Result<String> {
    let json = serde_json::to_string(entries)?;
    Ok(format!("{:x}", md5::compute(json)))
}

/// File store configuration
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Path to the JSON document
    pub path: PathBuf,
    /// Current schema version
    pub version: u32,
    /// Enable atomic writes with temp files
    pub atomic_writes: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("campus_guide_store.json"),
            version: 1,
            atomic_writes: true,
        }
    }
}

impl FileStoreConfig {
    /// Create a new configuration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set schema version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }
}

/// Key-value store persisted as a single JSON document
pub struct FileKvStore {
    config: FileStoreConfig,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKvStore {
    /// Open the store, loading existing entries from disk
    ///
    /// A missing file starts an empty store. A corrupt or foreign-version file
    /// is an error so the caller can decide whether to discard it.
    pub async fn open(config: FileStoreConfig) -> Result<Self> {
        let entries = match load_from_disk(&config).await {
            Ok(entries) => entries,
            Err(KvError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        tracing::debug!(path = %config.path.display(), keys = entries.len(), "opened file key-value store");

        Ok(Self { config, entries: RwLock::new(entries) })
    }

    /// Path of the backing document
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn write_to_disk(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let document = VersionedDocument::new(self.config.version, entries.clone())?;
        let json = serde_json::to_string_pretty(&document)?;

        if self.config.atomic_writes {
            self.write_atomic(&json).await
        } else {
            fs::write(&self.config.path, json).await?;
            Ok(())
        }
    }

    async fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.config.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.config.path).await?;

        Ok(())
    }
}

async fn load_from_disk(config: &FileStoreConfig) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(&config.path).await?;
    let document: VersionedDocument = serde_json::from_str(&contents)?;

    document.verify_checksum()?;

    if document.version != config.version {
        return Err(KvError::VersionMismatch {
            expected: config.version,
            found: document.version,
        });
    }

    Ok(document.entries)
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());

        // Memory only moves forward once the document is on disk.
        self.write_to_disk(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);

        self.write_to_disk(&next).await?;
        *entries = next;
        Ok(())
    }
}
