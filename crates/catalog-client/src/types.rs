//! OpenLibrary response types
//!
//! Raw documents mirror the JSON the API returns, where almost every field is
//! optional. [`CatalogEntry`] is the normalized form the screens use.

use serde::{Deserialize, Serialize};

/// Title used when a document has none
pub const UNTITLED: &str = "Untitled";

/// Author used when a document lists none
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Raw search document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDoc {
    /// Work key (e.g. `/works/OL45883W`)
    #[serde(default)]
    pub key: Option<String>,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Cover image identifier
    #[serde(default)]
    pub cover_i: Option<u64>,
    /// Author names
    #[serde(default)]
    pub author_name: Option<Vec<String>>,
    /// Year of first publication
    #[serde(default)]
    pub first_publish_year: Option<i32>,
}

/// Raw search response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total number of matches reported by the API
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    /// Matching documents (first page only)
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

impl SearchResponse {
    /// Normalize every document, in order
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.docs.iter().map(CatalogEntry::from_doc).collect()
    }
}

/// A normalized catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog identifier; documents without one cannot be favourited
    pub key: Option<String>,
    /// Title, or [`UNTITLED`]
    pub title: String,
    /// Cover image identifier
    pub cover_i: Option<u64>,
    /// Author names, or `[UNKNOWN_AUTHOR]`
    pub author_name: Vec<String>,
    /// Year of first publication
    pub first_publish_year: Option<i32>,
}

impl CatalogEntry {
    /// Normalize a raw document
    pub fn from_doc(doc: &SearchDoc) -> Self {
        let author_name = match &doc.author_name {
            Some(names) if !names.is_empty() => names.clone(),
            _ => vec![UNKNOWN_AUTHOR.to_string()],
        };

        Self {
            key: doc.key.clone().filter(|key| !key.trim().is_empty()),
            title: doc
                .title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            cover_i: doc.cover_i,
            author_name,
            first_publish_year: doc.first_publish_year,
        }
    }

    /// Key to list this entry under at `index` in a result page
    ///
    /// Only stable within one page; use [`CatalogEntry::key`] for anything
    /// that outlives the page.
    pub fn list_key(&self, index: usize) -> String {
        self.key.clone().unwrap_or_else(|| index.to_string())
    }

    /// Authors joined for display
    pub fn authors(&self) -> String {
        self.author_name.join(", ")
    }
}

/// Work description, either plain text or a typed text value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum Description {
    Text(String),
    Typed { value: String },
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let description = Option::<Description>::deserialize(deserializer)?;
    Ok(description.map(|d| match d {
        Description::Text(text) => text,
        Description::Typed { value } => value,
    }))
}

/// Details of a single work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDetails {
    /// Work key
    #[serde(default)]
    pub key: String,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Description text
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: Option<String>,
    /// Cover image identifiers (the API uses -1 for missing covers)
    #[serde(default)]
    pub covers: Vec<i64>,
    /// Subject headings
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl WorkDetails {
    /// First usable cover identifier
    pub fn cover_id(&self) -> Option<u64> {
        self.covers
            .iter()
            .find(|id| **id > 0)
            .and_then(|id| u64::try_from(*id).ok())
    }

    /// Title for display
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults() {
        let entry = CatalogEntry::from_doc(&SearchDoc::default());

        assert_eq!(entry.key, None);
        assert_eq!(entry.list_key(3), "3");
        assert_eq!(entry.title, UNTITLED);
        assert_eq!(entry.author_name, vec![UNKNOWN_AUTHOR.to_string()]);
        assert_eq!(entry.cover_i, None);
        assert_eq!(entry.first_publish_year, None);
    }

    #[test]
    fn test_entry_from_full_doc() {
        let doc: SearchDoc = serde_json::from_value(serde_json::json!({
            "key": "/works/OL45883W",
            "title": "The Pragmatic Programmer",
            "cover_i": 8091016,
            "author_name": ["Andrew Hunt", "David Thomas"],
            "first_publish_year": 1999,
            "edition_count": 12
        }))
        .unwrap();

        let entry = CatalogEntry::from_doc(&doc);
        assert_eq!(entry.key.as_deref(), Some("/works/OL45883W"));
        assert_eq!(entry.list_key(0), "/works/OL45883W");
        assert_eq!(entry.cover_i, Some(8091016));
        assert_eq!(entry.authors(), "Andrew Hunt, David Thomas");
        assert_eq!(entry.first_publish_year, Some(1999));
    }

    #[test]
    fn test_search_response_entries() {
        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "numFound": 2,
            "docs": [{"key": "/works/OL1W", "title": "A"}, {"title": "B"}]
        }))
        .unwrap();

        let entries = response.entries();
        assert_eq!(response.num_found, 2);
        assert_eq!(entries[0].key.as_deref(), Some("/works/OL1W"));
        assert_eq!(entries[1].key, None);
        assert_eq!(entries[1].list_key(1), "1");
    }

    #[test]
    fn test_description_shapes() {
        let plain: WorkDetails =
            serde_json::from_value(serde_json::json!({"key": "/works/OL1W", "description": "Plain"}))
                .unwrap();
        assert_eq!(plain.description.as_deref(), Some("Plain"));

        let typed: WorkDetails = serde_json::from_value(serde_json::json!({
            "key": "/works/OL1W",
            "description": {"type": "/type/text", "value": "Typed"}
        }))
        .unwrap();
        assert_eq!(typed.description.as_deref(), Some("Typed"));

        let missing: WorkDetails =
            serde_json::from_value(serde_json::json!({"key": "/works/OL1W"})).unwrap();
        assert_eq!(missing.description, None);
        assert_eq!(missing.display_title(), UNTITLED);
    }

    #[test]
    fn test_cover_id_skips_missing_markers() {
        let details = WorkDetails { covers: vec![-1, 0, 42], ..Default::default() };
        assert_eq!(details.cover_id(), Some(42));

        let none = WorkDetails { covers: vec![-1], ..Default::default() };
        assert_eq!(none.cover_id(), None);
    }
}
