use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the matching layer.
pub type MatchResult<T> = Result<T, MatchError>;

/// Failures reported by an [`EmbeddingProvider`](crate::EmbeddingProvider).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached or refused the request.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    /// The provider did not answer within its own deadline.
    #[error("embedding provider timed out")]
    Timeout,
}

/// Failure reported by a [`CatalogSource`](crate::CatalogSource).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CatalogError(pub String);

/// Errors produced by the matching engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    /// A stored embedding disagrees with the query vector's dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Page number or page size violates the pagination contract.
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),
    /// The request itself is malformed (e.g. empty owner id).
    #[error("invalid match request: {0}")]
    InvalidRequest(String),
    /// The referenced catalog entry does not exist.
    #[error("catalog entry not found: {0}")]
    EntryNotFound(String),
    /// The pivot entry has no stored embedding to search with.
    #[error("catalog entry has no embedding: {0}")]
    NoEmbedding(String),
    /// The embedding provider failed.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The embedding provider exceeded the configured deadline.
    #[error("embedding provider timed out after {0:?}")]
    ProviderTimeout(Duration),
    /// The caller cancelled the request while the provider call was in flight.
    #[error("match request cancelled")]
    Cancelled,
    /// The catalog collaborator failed to supply candidates.
    #[error("catalog source error: {0}")]
    Catalog(String),
}

impl MatchError {
    /// Whether retrying the same request later can succeed.
    ///
    /// Only provider failures are transient; everything else is either a
    /// caller contract violation or a data-integrity problem.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MatchError::ProviderUnavailable(_) | MatchError::ProviderTimeout(_)
        )
    }
}

impl From<ProviderError> for MatchError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Unavailable(msg) => MatchError::ProviderUnavailable(msg),
            ProviderError::Timeout => MatchError::ProviderTimeout(Duration::ZERO),
        }
    }
}

impl From<CatalogError> for MatchError {
    fn from(value: CatalogError) -> Self {
        MatchError::Catalog(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_reports_both_lengths() {
        let err = MatchError::DimensionMismatch {
            expected: 384,
            actual: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("384"));
        assert!(msg.contains("512"));
    }

    #[test]
    fn provider_errors_convert_to_match_errors() {
        let err: MatchError = ProviderError::Unavailable("503".into()).into();
        assert_eq!(err, MatchError::ProviderUnavailable("503".into()));

        let err: MatchError = ProviderError::Timeout.into();
        assert!(matches!(err, MatchError::ProviderTimeout(_)));
    }

    #[test]
    fn catalog_errors_keep_their_message() {
        let err: MatchError = CatalogError("connection refused".into()).into();
        assert_eq!(err.to_string(), "catalog source error: connection refused");
    }

    #[test]
    fn only_provider_failures_are_transient() {
        assert!(MatchError::ProviderUnavailable("down".into()).is_transient());
        assert!(MatchError::ProviderTimeout(Duration::from_secs(1)).is_transient());

        assert!(!MatchError::NoEmbedding("outfit-1".into()).is_transient());
        assert!(!MatchError::InvalidPageRequest("page".into()).is_transient());
        assert!(
            !MatchError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
            .is_transient()
        );
        assert!(!MatchError::Cancelled.is_transient());
    }
}
