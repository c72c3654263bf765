//! HTTP client for the OpenLibrary API
//!
//! # Examples
//! ```no_run
//! use catalog_client::{CatalogClient, CatalogClientConfig};
//!
//! async fn example() -> catalog_client::Result<()> {
//!     let client = CatalogClient::new(CatalogClientConfig::default())?;
//!
//!     let results = client.search("rust").await?;
//!     for entry in &results.entries {
//!         println!("{} by {}", entry.title, entry.authors());
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::cover::{cover_url_with, CoverSize, DEFAULT_COVERS_URL, PLACEHOLDER_URL};
use crate::types::{CatalogEntry, SearchResponse, WorkDetails};
use crate::{CatalogError, Result};
use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Query used when the search box is empty
pub const DEFAULT_QUERY: &str = "computer";

/// Message shown when a search cannot be completed
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to fetch courses. Try again later.";

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the catalog client
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// API base URL
    pub base_url: String,
    /// Covers API base URL
    pub covers_url: String,
    /// Image used for entries without a cover
    pub placeholder_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum number of search results
    pub search_limit: u32,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            placeholder_url: PLACEHOLDER_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("CampusGuide/{}", env!("CARGO_PKG_VERSION")),
            search_limit: 20,
        }
    }
}

impl CatalogClientConfig {
    /// Create a new config with an API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the covers base URL
    pub fn with_covers_url(mut self, covers_url: impl Into<String>) -> Self {
        self.covers_url = covers_url.into();
        self
    }

    /// Set the placeholder image URL
    pub fn with_placeholder_url(mut self, placeholder_url: impl Into<String>) -> Self {
        self.placeholder_url = placeholder_url.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the search result limit
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }
}

// =============================================================================
// Search State
// =============================================================================

/// What a catalog screen renders after a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Query that was actually sent
    pub query: String,
    /// Entries to display
    pub entries: Vec<CatalogEntry>,
    /// User-facing error, if the search failed
    pub error: Option<String>,
}

impl SearchState {
    /// Whether the search failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// =============================================================================
// Client Implementation
// =============================================================================

/// OpenLibrary catalog client
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: ReqwestClient,
    config: CatalogClientConfig,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(config: CatalogClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Search the catalog
    ///
    /// A blank query searches for [`DEFAULT_QUERY`]. Only the first page is
    /// fetched.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let query = effective_query(query);
        let url = format!("{}/search.json", self.base_url());
        let limit = self.config.search_limit.to_string();

        tracing::debug!("Searching catalog for {:?}", query);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("limit", limit.as_str())]);

        let response: SearchResponse = self.execute_request(request).await?;
        let entries = response.entries();
        tracing::debug!(
            "Catalog search for {:?} returned {} of {} results",
            query,
            entries.len(),
            response.num_found
        );

        Ok(SearchResults {
            query,
            num_found: response.num_found,
            entries,
        })
    }

    /// Search, folding any failure into a displayable state
    pub async fn search_state(&self, query: &str) -> SearchState {
        match self.search(query).await {
            Ok(results) => SearchState {
                query: results.query,
                entries: results.entries,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Catalog search failed: {}", e);
                SearchState {
                    query: effective_query(query),
                    entries: Vec::new(),
                    error: Some(SEARCH_FAILED_MESSAGE.to_string()),
                }
            }
        }
    }

    /// Fetch a single work by key (e.g. `/works/OL45883W`)
    pub async fn work_details(&self, id: &str) -> Result<WorkDetails> {
        let id = id.trim();
        if id.is_empty() || id == "/" {
            return Err(CatalogError::InvalidInput("work id is empty".to_string()));
        }

        let path = if id.starts_with('/') {
            id.to_string()
        } else {
            format!("/{}", id)
        };
        let url = format!("{}{}.json", self.base_url(), path);

        tracing::debug!("Fetching work details for {}", path);
        let mut details: WorkDetails = self.execute_request(self.client.get(&url)).await?;
        if details.key.is_empty() {
            details.key = path;
        }

        Ok(details)
    }

    /// Cover image URL on the configured hosts
    pub fn cover_url(&self, cover_id: Option<u64>, size: CoverSize) -> String {
        cover_url_with(
            &self.config.covers_url,
            &self.config.placeholder_url,
            cover_id,
            size,
        )
    }

    /// Get the client configuration
    pub fn config(&self) -> &CatalogClientConfig {
        &self.config
    }

    /// Get the API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn execute_request<T>(&self, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                body
            };
            return Err(CatalogError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Normalized results of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    /// Query that was actually sent
    pub query: String,
    /// Total number of matches reported by the API
    pub num_found: u64,
    /// First page of entries
    pub entries: Vec<CatalogEntry>,
}

fn effective_query(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        query.to_string()
    }
}
