//! Application configuration

use crate::AppError;
use app_state::HashingConfig;
use catalog_client::CatalogClientConfig;
use std::path::PathBuf;
use std::str::FromStr;
use storage::{FileStoreConfig, KvConfig};

/// File name of the sled database inside the data directory
pub const SLED_DB_NAME: &str = "campus_guide_kv.db";

/// File name of the JSON document inside the data directory
pub const FILE_STORE_NAME: &str = "campus_guide_store.json";

/// Which key-value backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// sled database
    #[default]
    Sled,
    /// Single JSON document
    File,
    /// Process memory; nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sled" => Ok(StorageBackend::Sled),
            "file" | "json" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::Config(format!("unknown storage backend: {}", other))),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding on-disk state
    pub data_dir: PathBuf,
    /// Key-value backend
    pub storage: StorageBackend,
    /// Catalog client settings
    pub catalog: CatalogClientConfig,
    /// Password hashing cost
    pub hashing: HashingConfig,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_directive: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            storage: StorageBackend::default(),
            catalog: CatalogClientConfig::default(),
            hashing: HashingConfig::default(),
            log_directive: crate::logging::DEFAULT_DIRECTIVE.to_string(),
        }
    }
}

impl AppConfig {
    /// Create a config rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Ephemeral config for tests and previews
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            hashing: HashingConfig::fast(),
            ..Default::default()
        }
    }

    /// Set the storage backend
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    /// Set the catalog client config
    pub fn with_catalog(mut self, catalog: CatalogClientConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the password hashing cost
    pub fn with_hashing(mut self, hashing: HashingConfig) -> Self {
        self.hashing = hashing;
        self
    }

    /// Set the default log directive
    pub fn with_log_directive(mut self, directive: impl Into<String>) -> Self {
        self.log_directive = directive.into();
        self
    }

    /// sled settings for this data directory
    pub fn kv_config(&self) -> KvConfig {
        KvConfig::new(self.data_dir.join(SLED_DB_NAME).to_string_lossy().into_owned())
    }

    /// JSON-file settings for this data directory
    pub fn file_store_config(&self) -> FileStoreConfig {
        FileStoreConfig::new(self.data_dir.join(FILE_STORE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("sled".parse::<StorageBackend>().unwrap(), StorageBackend::Sled);
        assert_eq!(" JSON ".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!(matches!(
            "redis".parse::<StorageBackend>(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_paths_follow_data_dir() {
        let config = AppConfig::new("/tmp/campus");
        assert_eq!(config.kv_config().path, "/tmp/campus/campus_guide_kv.db");
        assert_eq!(
            config.file_store_config().path,
            PathBuf::from("/tmp/campus/campus_guide_store.json")
        );
    }

    #[test]
    fn test_builder() {
        let config = AppConfig::new("data")
            .with_storage(StorageBackend::File)
            .with_catalog(CatalogClientConfig::new("http://localhost:1"))
            .with_hashing(HashingConfig::fast())
            .with_log_directive("debug");

        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.catalog.base_url, "http://localhost:1");
        assert_eq!(config.hashing, HashingConfig::fast());
        assert_eq!(config.log_directive, "debug");
    }

    #[test]
    fn test_in_memory() {
        let config = AppConfig::in_memory();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.hashing, HashingConfig::fast());
    }
}
