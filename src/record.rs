use serde::{Deserialize, Serialize};

/// Thumbnail shown when a catalog has no cover for a book
pub const PLACEHOLDER_THUMBNAIL: &str = "/static/images/upscaled-image.png";

/// Normalized book record shared by every catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteraryRecord {
    /// Catalog-assigned identifier, may be empty and is not unique across catalogs
    pub id: String,
    /// Book title
    pub title: String,
    /// Authors in catalog order
    pub authors: Vec<String>,
    /// Publication year or date exactly as the catalog reports it
    pub year: String,
    /// Cover image URL, or `PLACEHOLDER_THUMBNAIL`
    pub thumbnail_url: String,
    /// Link to the catalog's page for this book
    pub detail_url: String,
    #[serde(default)]
    pub status: RecordStatus,
}

impl LiteraryRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: String::new(),
            thumbnail_url: PLACEHOLDER_THUMBNAIL.to_string(),
            detail_url: String::new(),
            status: RecordStatus::None,
        }
    }

    pub fn has_placeholder_thumbnail(&self) -> bool {
        self.thumbnail_url == PLACEHOLDER_THUMBNAIL
    }
}

/// Thumbnail URL to store for a record, substituting the placeholder for missing covers
pub fn thumbnail_or_placeholder(url: Option<&str>) -> String {
    match url {
        Some(u) if !u.trim().is_empty() => u.to_string(),
        _ => PLACEHOLDER_THUMBNAIL.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Fresh search result, not saved anywhere
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "favorite")]
    Favorite,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::None => "",
            RecordStatus::Favorite => "favorite",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_plain_strings() {
        assert_eq!(serde_json::to_string(&RecordStatus::None).unwrap(), "\"\"");
        assert_eq!(
            serde_json::to_string(&RecordStatus::Favorite).unwrap(),
            "\"favorite\""
        );
        let parsed: RecordStatus = serde_json::from_str("\"favorite\"").unwrap();
        assert_eq!(parsed, RecordStatus::Favorite);
    }

    #[test]
    fn missing_status_defaults_to_none() {
        let json = r#"{
            "id": "x",
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "year": "1965",
            "thumbnail_url": "",
            "detail_url": ""
        }"#;
        let record: LiteraryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, RecordStatus::None);
        assert_eq!(record.authors, vec!["Frank Herbert".to_string()]);
    }

    #[test]
    fn blank_thumbnail_falls_back_to_placeholder() {
        assert_eq!(thumbnail_or_placeholder(None), PLACEHOLDER_THUMBNAIL);
        assert_eq!(thumbnail_or_placeholder(Some("  ")), PLACEHOLDER_THUMBNAIL);
        assert_eq!(
            thumbnail_or_placeholder(Some("http://img/1.jpg")),
            "http://img/1.jpg"
        );
        assert!(LiteraryRecord::new("", "t").has_placeholder_thumbnail());
    }
}
