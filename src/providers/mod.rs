pub use async_trait::async_trait;

pub mod google_books;
pub mod open_library;

use crate::http::{HttpResponse, TransportError};
use crate::record::LiteraryRecord;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider}: network error: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("{provider} returned HTTP status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider}: failed to decode response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} did not answer within {after:?}")]
    TimedOut {
        provider: &'static str,
        after: Duration,
    },
    #[error("{provider}: search task ended abnormally: {message}")]
    Task {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Network { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Decode { provider, .. }
            | ProviderError::TimedOut { provider, .. }
            | ProviderError::Task { provider, .. } => provider,
        }
    }
}

/// A book catalog that can be searched by free text
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run one search against the catalog and map every hit to a record
    async fn search(&self, query: &str) -> Result<Vec<LiteraryRecord>, ProviderError>;

    /// Get the name of this catalog
    fn name(&self) -> &'static str;
}

/// Reject non-2xx responses, then decode the JSON body
pub(crate) fn decode_json<T: DeserializeOwned>(
    provider: &'static str,
    response: HttpResponse,
) -> Result<T, ProviderError> {
    if !response.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: response.status,
        });
    }

    serde_json::from_str(&response.body).map_err(|e| ProviderError::Decode {
        provider,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        n: u32,
    }

    #[test]
    fn non_success_status_is_reported_before_decoding() {
        let err = decode_json::<Payload>("Test", HttpResponse::new(503, "not json")).unwrap_err();
        assert_eq!(
            err,
            ProviderError::Status {
                provider: "Test",
                status: 503
            }
        );
        assert_eq!(err.provider(), "Test");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode_json::<Payload>("Test", HttpResponse::new(200, "{\"n\": \"x\"}")).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { provider: "Test", .. }));

        let ok: Payload = decode_json("Test", HttpResponse::new(200, "{\"n\": 3}")).unwrap();
        assert_eq!(ok.n, 3);
    }
}
