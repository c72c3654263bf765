//! OpenLibrary catalog client
//!
//! The course catalog is backed by the public OpenLibrary API: a search
//! endpoint, per-work details and cover images. This crate wraps those
//! endpoints and normalizes the loosely typed responses.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod cover;
pub mod types;

pub use client::{
    CatalogClient, CatalogClientConfig, SearchResults, SearchState, DEFAULT_QUERY,
    SEARCH_FAILED_MESSAGE,
};
pub use cover::{cover_url, CoverSize, PLACEHOLDER_URL};
pub use types::{CatalogEntry, SearchResponse, WorkDetails};

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Http { status, .. } => Some(*status),
            CatalogError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the request never got a response
    pub fn is_network_error(&self) -> bool {
        matches!(self, CatalogError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error (404): Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_network_error());

        let err = CatalogError::InvalidInput("empty id".to_string());
        assert!(err.to_string().contains("Invalid input"));
        assert_eq!(err.status(), None);
    }
}
