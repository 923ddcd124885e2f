use super::{async_trait, decode_json, Provider, ProviderError};
use crate::http::{HttpClient, HttpResponse};
use crate::record::{thumbnail_or_placeholder, LiteraryRecord, RecordStatus};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const NAME: &str = "Google Books";
const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1/volumes";
const GOOGLE_BOOKS_DETAIL_BASE: &str = "https://books.google.com/books";
const FIELDS: &str = "items(id,volumeInfo/title,volumeInfo/authors,volumeInfo/publishedDate,volumeInfo/description,volumeInfo/infoLink,volumeInfo/imageLinks/thumbnail)";
const MAX_RESULTS: u32 = 40;

pub struct GoogleBooksClient {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(http: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Self { http, api_key }
    }

    fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}?q={}&maxResults={}&projection=full&printType=books&fields={}",
            GOOGLE_BOOKS_API_BASE,
            urlencoding::encode(query),
            MAX_RESULTS,
            urlencoding::encode(FIELDS)
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&key={}", urlencoding::encode(key)));
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(default)]
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    published_date: Option<String>,
    image_links: Option<ImageLinks>,
    info_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl Volume {
    fn to_record(&self) -> LiteraryRecord {
        let info = &self.volume_info;

        let detail_url = match &info.info_link {
            Some(link) if !link.is_empty() => link.clone(),
            _ if !self.id.is_empty() => format!(
                "{}?id={}",
                GOOGLE_BOOKS_DETAIL_BASE,
                urlencoding::encode(&self.id)
            ),
            _ => String::new(),
        };

        LiteraryRecord {
            id: self.id.clone(),
            title: info.title.clone().unwrap_or_default(),
            authors: info.authors.clone().unwrap_or_default(),
            year: info.published_date.clone().unwrap_or_default(),
            thumbnail_url: thumbnail_or_placeholder(
                info.image_links.as_ref().and_then(|l| l.thumbnail.as_deref()),
            ),
            detail_url,
            status: RecordStatus::None,
        }
    }
}

/// Check the status of a Google Books volumes response and map its body to records, preserving response order
pub fn parse_response(response: HttpResponse) -> Result<Vec<LiteraryRecord>, ProviderError> {
    let response: VolumesResponse = decode_json(NAME, response)?;
    Ok(response.items.iter().map(|v| v.to_record()).collect())
}

#[async_trait]
impl Provider for GoogleBooksClient {
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
