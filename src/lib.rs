pub mod aggregator;
pub mod favorites;
pub mod http;
pub mod identity;
pub mod providers;
pub mod record;
pub mod report;
pub mod service;
pub mod testing;

use aggregator::{Aggregator, DEFAULT_PROVIDER_TIMEOUT};
use http::{HttpClient, ReqwestHttpClient, TransportError};
use providers::{google_books::GoogleBooksClient, open_library::OpenLibraryClient, Provider};
use service::SearchService;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use record::{LiteraryRecord, RecordStatus};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] TransportError),
}

/// Configuration for the catalog search
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub use_google_books: bool,
    pub use_open_library: bool,
    /// Google Books works without a key, but with a much lower quota
    pub google_books_api_key: Option<String>,
    /// Preferred edition language for Open Library
    pub open_library_language: Option<String>,
    /// Deadline for each catalog request
    pub timeout: Duration,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            use_google_books: true,
            use_open_library: true,
            google_books_api_key: None,
            open_library_language: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl FinderConfig {
    /// Read `API_KEY`, `LITFINDER_TIMEOUT_SECS` and `LITFINDER_LANG` from the
    /// environment, falling back to a `.env` file in the working directory
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_file(Path::new(".env"))
    }

    /// Like [`FinderConfig::from_env`] with an explicit dotenv file. Process
    /// environment variables win over the file.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let file = read_dotenv(path);
        Self::from_lookup(layered(|name| std::env::var(name).ok(), file))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let google_books_api_key = lookup("API_KEY").filter(|k| !k.trim().is_empty());
        if google_books_api_key.is_none() {
            warn!("API_KEY is not set, Google Books requests may be rate limited");
        }

        let timeout = match lookup("LITFINDER_TIMEOUT_SECS") {
            Some(value) => parse_timeout("LITFINDER_TIMEOUT_SECS", &value)?,
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        Ok(Self {
            google_books_api_key,
            open_library_language: lookup("LITFINDER_LANG").filter(|l| !l.trim().is_empty()),
            timeout,
            ..Self::default()
        })
    }
}

/// Variables from a dotenv file. The process environment is left untouched.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "No dotenv file");
            return HashMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read dotenv file");
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed dotenv line");
            }
        }
    }
    vars
}

/// Look a variable up in `env` first, then in `file`
fn layered(
    env: impl Fn(&str) -> Option<String>,
    file: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> {
    move |name| env(name).or_else(|| file.get(name).cloned())
}

/// Extra time the HTTP client gets beyond the catalog deadline
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Deadline for the HTTP client. It outlasts the catalog deadline so that a
/// slow catalog is always reported as timed out by the aggregator.
fn http_timeout(config: &FinderConfig) -> Duration {
    config.timeout + HTTP_TIMEOUT_SLACK
}

/// Parse a whole number of seconds greater than zero
pub fn parse_timeout(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            name,
            value: value.to_string(),
        }),
    }
}

/// Build the search service with a real HTTP client
pub fn build_service(config: &FinderConfig) -> Result<SearchService, ConfigError> {
    let http = Arc::new(ReqwestHttpClient::new(http_timeout(config))?);
    Ok(build_service_with_http(config, http))
}

/// Build the search service on top of any `HttpClient`
pub fn build_service_with_http(config: &FinderConfig, http: Arc<dyn HttpClient>) -> SearchService {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if config.use_google_books {
        providers.push(Arc::new(GoogleBooksClient::new(
            Arc::clone(&http),
            config.google_books_api_key.clone(),
        )));
    }
    if config.use_open_library {
        providers.push(Arc::new(
            OpenLibraryClient::new(Arc::clone(&http))
                .with_language(config.open_library_language.clone()),
        ));
    }

    SearchService::new(Aggregator::new(providers).with_timeout(config.timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let config = FinderConfig::from_lookup(lookup(&[
            ("API_KEY", "secret"),
            ("LITFINDER_TIMEOUT_SECS", "3"),
            ("LITFINDER_LANG", "ru"),
        ]))
        .unwrap();

        assert_eq!(config.google_books_api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.open_library_language.as_deref(), Some("ru"));
        assert!(config.use_google_books && config.use_open_library);
    }

    #[test]
    fn empty_env_gives_defaults() {
        let config = FinderConfig::from_lookup(lookup(&[("API_KEY", "")])).unwrap();
        assert_eq!(config.google_books_api_key, None);
        assert_eq!(config.timeout, DEFAULT_PROVIDER_TIMEOUT);
        assert_eq!(config.open_library_language, None);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        assert!(matches!(
            FinderConfig::from_lookup(lookup(&[("LITFINDER_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(parse_timeout("t", "0").is_err());
    }

    #[test]
    fn dotenv_file_supplies_missing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "LITFINDER_TEST_ONLY_KEY=from-file\nLITFINDER_TEST_ONLY_LANG=\"de\"\n",
        )
        .unwrap();

        let vars = read_dotenv(&path);
        assert_eq!(vars.get("LITFINDER_TEST_ONLY_KEY").map(String::as_str), Some("from-file"));
        assert_eq!(vars.get("LITFINDER_TEST_ONLY_LANG").map(String::as_str), Some("de"));
    }

    #[test]
    fn missing_dotenv_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dotenv(&dir.path().join(".env")).is_empty());
        assert!(FinderConfig::from_env_file(&dir.path().join(".env")).is_ok());
    }

    #[test]
    fn dotenv_file_feeds_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LITFINDER_TIMEOUT_SECS=4\n").unwrap();

        let config = FinderConfig::from_lookup(layered(lookup(&[]), read_dotenv(&path))).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(4));
    }

    #[test]
    fn process_env_wins_over_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "API_KEY=from-file\nLITFINDER_LANG=de\n").unwrap();

        let env = lookup(&[("API_KEY", "from-env")]);
        let config = FinderConfig::from_lookup(layered(env, read_dotenv(&path))).unwrap();
        assert_eq!(config.google_books_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.open_library_language.as_deref(), Some("de"));
    }

    #[test]
    fn http_client_outlasts_catalog_deadline() {
        let config = FinderConfig {
            timeout: Duration::from_secs(3),
            ..FinderConfig::default()
        };
        assert!(http_timeout(&config) > config.timeout);
    }

    #[test]
    fn disabled_catalogs_are_not_registered() {
        let http = Arc::new(testing::StubHttpClient::new());
        let config = FinderConfig {
            use_google_books: false,
            ..FinderConfig::default()
        };

        let service = build_service_with_http(&config, http);
        assert_eq!(service.aggregator().provider_names(), vec!["Open Library"]);
    }
}
