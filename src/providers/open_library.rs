use super::{async_trait, decode_json, Provider, ProviderError};
use crate::http::{HttpClient, HttpResponse};
use crate::record::{thumbnail_or_placeholder, LiteraryRecord, RecordStatus};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const NAME: &str = "Open Library";
const OPEN_LIBRARY_BASE: &str = "https://openlibrary.org";
const OPEN_LIBRARY_COVERS_BASE: &str = "https://covers.openlibrary.org/b/id";
const FIELDS: &str = "key,title,author_name,first_publish_year,cover_i";

pub struct OpenLibraryClient {
    http: Arc<dyn HttpClient>,
    language: Option<String>,
}

impl OpenLibraryClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            language: None,
        }
    }

    /// Prefer editions in the given language (e.g. "ru", "en")
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/search.json?q={}&fields={}",
            OPEN_LIBRARY_BASE,
            urlencoding::encode(query),
            FIELDS
        );
        if let Some(lang) = &self.language {
            url.push_str(&format!("&lang={}", urlencoding::encode(lang)));
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    key: Option<String>,
    title: Option<String>,
    author_name: Option<Vec<String>>,
    first_publish_year: Option<i64>,
    cover_i: Option<i64>,
}

/// Cover URL for an Open Library cover id, medium size
pub fn cover_url(cover_id: i64) -> String {
    format!("{}/{}-M.jpg", OPEN_LIBRARY_COVERS_BASE, cover_id)
}

impl Doc {
    fn to_record(&self) -> LiteraryRecord {
        let key = self.key.clone().unwrap_or_default();

        let cover = self.cover_i.filter(|&id| id > 0).map(cover_url);
        let detail_url = if key.is_empty() {
            String::new()
        } else {
            format!("{}{}", OPEN_LIBRARY_BASE, key)
        };

        LiteraryRecord {
            title: self.title.clone().unwrap_or_default(),
            authors: self.author_name.clone().unwrap_or_default(),
            year: self
                .first_publish_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            thumbnail_url: thumbnail_or_placeholder(cover.as_deref()),
            detail_url,
            status: RecordStatus::None,
            id: key,
        }
    }
}

/// Check the status of a Open Library search response and map its body to records, preserving response order
pub fn parse_response(response: HttpResponse) -> Result<Vec<LiteraryRecord>, ProviderError> {
    let response: SearchResponse = decode_json(NAME, response)?;
    Ok(response.docs.iter().map(|d| d.to_record()).collect())
}

#[async_trait]
impl Provider for OpenLibraryClient {
    async fn search(&self, query: &str) -> Result<Vec<LiteraryRecord>, ProviderError> {
        let url = self.search_url(query);
        debug!(provider = NAME, query, "Searching catalog");

        let response = self
            .http
            .get(&url)
            .await
            .map_err(|source| ProviderError::Network {
                provider: NAME,
                source,
            })?;

        let records = parse_response(response)?;

        debug!(provider = NAME, count = records.len(), "Catalog answered");
        Ok(records)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
