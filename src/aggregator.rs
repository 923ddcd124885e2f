use crate::providers::{Provider, ProviderError};
use crate::record::LiteraryRecord;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Default deadline for a single catalog call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no catalogs are configured")]
    NoProviders,
}

/// A catalog that contributed nothing to a search, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: &'static str,
    pub error: ProviderError,
}

impl From<ProviderError> for ProviderFailure {
    fn from(error: ProviderError) -> Self {
        Self {
            provider: error.provider(),
            error,
        }
    }
}

/// Merged records plus the catalogs that failed along the way
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub records: Vec<LiteraryRecord>,
    pub failures: Vec<ProviderFailure>,
    /// Number of catalogs the query was sent to
    pub dispatched: usize,
}

impl SearchOutcome {
    /// True only when every dispatched catalog failed. A catalog that answered
    /// with zero records is a success.
    pub fn all_failed(&self) -> bool {
        self.dispatched > 0 && self.failures.len() == self.dispatched
    }
}

/// Fans one query out to every registered catalog in parallel and merges
/// whatever comes back.
///
/// Records from one catalog keep that catalog's order. The order between
/// catalogs follows completion order and is not stable across calls. A failing
/// or slow catalog contributes nothing and never fails the whole search.
pub struct Aggregator {
    providers: Vec<Arc<dyn Provider>>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Deadline applied to each catalog call independently
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Search every catalog and return the merged records
    pub async fn search(&self, query: &str) -> Result<Vec<LiteraryRecord>, AggregateError> {
        self.search_detailed(query).await.map(|outcome| outcome.records)
    }

    /// Search every catalog, returning the merged records and the failures
    pub async fn search_detailed(&self, query: &str) -> Result<SearchOutcome, AggregateError> {
        if self.providers.is_empty() {
            return Err(AggregateError::NoProviders);
        }

        let start = Instant::now();
        debug!(
            providers = ?self.provider_names(),
            query,
            "Starting parallel search"
        );

        // Dropping the set aborts anything still running, so no task outlives the call
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let query = query.to_string();
            let timeout = self.timeout;
            let name = provider.name();
            let handle = tasks.spawn(async move {
                let result = match tokio::time::timeout(timeout, provider.search(&query)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::TimedOut {
                        provider: name,
                        after: timeout,
                    }),
                };
                (name, result)
            });
            names.insert(handle.id(), name);
        }

        let mut outcome = SearchOutcome {
            dispatched: tasks.len(),
            ..SearchOutcome::default()
        };
        while let Some(joined) = tasks.join_next().await {
            let (provider, result) = match joined {
                Ok(finished) => finished,
                Err(e) => {
                    let provider = names.get(&e.id()).copied().unwrap_or("unknown");
                    let error = ProviderError::Task {
                        provider,
                        message: e.to_string(),
                    };
                    warn!(provider, error = %error, "Catalog search task failed");
                    outcome.failures.push(error.into());
                    continue;
                }
            };

            match result {
                Ok(mut records) => {
                    debug!(provider, count = records.len(), "Catalog results merged");
                    outcome.records.append(&mut records);
                }
                Err(error) => {
                    warn!(provider, error = %error, "Catalog search failed");
                    outcome.failures.push(error.into());
                }
            }
        }

        let elapsed = start.elapsed();
        if outcome.all_failed() {
            error!(
                query,
                failures = outcome.failures.len(),
                ?elapsed,
                "Every catalog failed, returning no results"
            );
        } else {
            debug!(
                results = outcome.records.len(),
                failures = outcome.failures.len(),
                ?elapsed,
                "Search complete"
            );
        }

        Ok(outcome)
    }
}
