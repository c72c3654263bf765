//! Core application logic for CampusGuide
//!
//! This crate wires the storage backend, the application stores and the
//! catalog client into a single [`CampusGuide`] service that the screens
//! hold for the lifetime of the app.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod logging;

pub use app::{favourite_from_entry, CampusGuide};
pub use config::{AppConfig, StorageBackend};

use app_state::AuthError;
use catalog_client::CatalogError;
use storage::KvError;

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Error types for application operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    /// Account error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = AppError::Config("unknown backend".to_string());
        assert!(err.to_string().contains("Invalid configuration"));

        let err = AppError::from(AuthError::EmailTaken);
        assert_eq!(err.to_string(), AuthError::EmailTaken.to_string());
    }
}
