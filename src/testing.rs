//! Stub implementations of the HTTP and catalog seams.
//!
//! These let the catalog clients and the aggregator be exercised without
//! network access, both from unit tests and from `tests/`.
//!
//! ```rust,ignore
//! use litfinder::testing::StubHttpClient;
//!
//! let http = StubHttpClient::new()
//!     .respond("https://openlibrary.org/", 200, r#"{"docs": []}"#)
//!     .respond("https://www.googleapis.com/", 429, "");
//! ```

use crate::http::{HttpClient, HttpResponse, TransportError};
use crate::providers::{async_trait, Provider, ProviderError};
use crate::record::LiteraryRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Route = (String, Result<HttpResponse, TransportError>);

/// `HttpClient` answering from a table of URL-prefix routes and recording every request
#[derive(Default)]
pub struct StubHttpClient {
    routes: Vec<Route>,
    requests: Mutex<Vec<String>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL starts with `prefix`
    pub fn respond(mut self, prefix: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((prefix.to_string(), Ok(HttpResponse::new(status, body))));
        self
    }

    /// Fail requests whose URL starts with `prefix` at the transport level
    pub fn fail(mut self, prefix: &str, error: TransportError) -> Self {
        self.routes.push((prefix.to_string(), Err(error)));
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        self.routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Err(TransportError::Connect(format!("no stub route for {}", url))))
    }
}

/// `Provider` returning a fixed outcome, optionally after a delay
pub struct StubProvider {
    name: &'static str,
    outcome: Result<Vec<LiteraryRecord>, ProviderError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn returning(name: &'static str, records: Vec<LiteraryRecord>) -> Self {
        Self {
            name,
            outcome: Ok(records),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str, error: ProviderError) -> Self {
        Self {
            name,
            outcome: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times `search` has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn search(&self, _query: &str) -> Result<Vec<LiteraryRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// `count` distinct records whose ids are `"{prefix}-0"`, `"{prefix}-1"`, ...
pub fn sample_records(prefix: &str, count: usize) -> Vec<LiteraryRecord> {
    (0..count)
        .map(|i| {
            let mut record = LiteraryRecord::new(format!("{}-{}", prefix, i), format!("{} book {}", prefix, i));
            record.authors = vec![format!("Author {}", i)];
            record.year = (1950 + i).to_string();
            record
        })
        .collect()
}
