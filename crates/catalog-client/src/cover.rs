//! Cover image URLs
//!
//! Covers are served by the OpenLibrary Covers API as
//! `{base}/b/id/{cover_id}-{size}.jpg`. Entries without a cover get a
//! placeholder image.

use std::fmt;

/// Default covers host
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";

/// Image shown when an entry has no cover
pub const PLACEHOLDER_URL: &str = "https://via.placeholder.com/150";

/// Cover image size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverSize {
    /// Small
    Small,
    /// Medium
    #[default]
    Medium,
    /// Large
    Large,
}

impl CoverSize {
    /// Size code used in the URL
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

impl fmt::Display for CoverSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cover URL on the default hosts
pub fn cover_url(cover_id: Option<u64>, size: CoverSize) -> String {
    cover_url_with(DEFAULT_COVERS_URL, PLACEHOLDER_URL, cover_id, size)
}

/// Cover URL on custom hosts
///
/// A missing or zero identifier yields `placeholder`.
pub fn cover_url_with(
    covers_url: &str,
    placeholder: &str,
    cover_id: Option<u64>,
    size: CoverSize,
) -> String {
    match cover_id {
        Some(id) if id != 0 => format!(
            "{}/b/id/{}-{}.jpg",
            covers_url.trim_end_matches('/'),
            id,
            size
        ),
        _ => placeholder.to_string(),
    }
}
