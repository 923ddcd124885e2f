use crate::aggregator::{AggregateError, Aggregator, SearchOutcome};
use crate::record::LiteraryRecord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("search for {query:?} failed: {source}")]
pub struct SearchError {
    pub query: String,
    #[source]
    pub source: AggregateError,
}

/// Entry point for callers that want book search results
pub struct SearchService {
    aggregator: Aggregator,
}

impl SearchService {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Search all catalogs, returning their records unchanged
    pub async fn search_literature(&self, query: &str) -> Result<Vec<LiteraryRecord>, SearchError> {
        self.aggregator
            .search(query)
            .await
            .map_err(|source| wrap(query, source))
    }

    /// Like `search_literature`, but also reports which catalogs failed
    pub async fn search_detailed(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        self.aggregator
            .search_detailed(query)
            .await
            .map_err(|source| wrap(query, source))
    }
}

fn wrap(query: &str, source: AggregateError) -> SearchError {
    SearchError {
        query: query.to_string(),
        source,
    }
}
