use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::config::{ConfigLoadError, EngineConfig};
use crate::error::{MatchError, MatchResult, ProviderError};
use crate::filter::AttributePredicate;
use crate::metrics::{MatchOperation, metrics_recorder};
use crate::page::{PageRequest, PagedResult, paginate, paginate_excluding};
use crate::provider::{CatalogSource, EmbeddingProvider};
use crate::rank::{CandidateRanker, RankedMatch};
use crate::types::{CatalogEntry, Embedding, EntryKind};


/// Attribute-driven match request, scoped to one owner's catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeQuery {
    pub owner_id: String,
    #[serde(default)]
    pub predicate: AttributePredicate,
    /// Free text to embed. Absent (or blank) means filter-only matching.
    #[serde(default)]
    pub query_text: Option<String>,
    /// Restrict to items or outfits.
    #[serde(default)]
    pub kind: Option<EntryKind>,
    /// Defaults to the first page of `EngineConfig::default_page_size`.
    #[serde(default)]
    pub page: Option<PageRequest>,
}

impl AttributeQuery {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ..Default::default()
        }
    }

    pub fn with_predicate(mut self, predicate: AttributePredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.query_text = Some(text.into());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    fn text(&self) -> Option<&str> {
        self.query_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Public entry point: resolve query vector, filter, rank, page.
///
/// Stateless between calls and read-only over whatever the catalog hands
/// out, so one engine can be shared freely across tasks and threads.
#[derive(Clone)]
pub struct MatchingEngine {
    provider: Arc<dyn EmbeddingProvider>,
    catalog: Arc<dyn CatalogSource>,
    ranker: CandidateRanker,
    config: EngineConfig,
}

impl MatchingEngine {
    /// Construct an engine with an explicit, validated configuration.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn CatalogSource>,
        config: EngineConfig,
    ) -> Result<Self, ConfigLoadError> {
        config.validate()?;
        Ok(Self {
            provider,
            catalog,
            ranker: config.ranker(),
            config,
        })
    }

    /// Construct an engine with [`EngineConfig::default`].
    pub fn with_defaults(
        provider: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        let config = EngineConfig::default();
        Self {
            provider,
            catalog,
            ranker: config.ranker(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rank one owner's entries against the attribute query.
    ///
    /// With query text the results are ordered by similarity to the text's
    /// embedding; without it every retained entry scores `0.0` and the order
    /// is newest first, then by id. `cancel` aborts an in-flight provider call.
    pub async fn match_by_attributes(
        &self,
        query: &AttributeQuery,
        cancel: &CancellationToken,
    ) -> MatchResult<PagedResult<RankedMatch>> {
        let span = info_span!(
            "matching.match_by_attributes",
            owner_id = %query.owner_id,
            has_text = query.text().is_some()
        );
        let start = Instant::now();
        let outcome = self
            .match_by_attributes_inner(query, cancel)
            .instrument(span.clone())
            .await;
        self.finish(MatchOperation::MatchByAttributes, start, outcome)
            .instrument(span)
            .await
    }

    /// Entries most similar to an existing entry, excluding the entry itself.
    ///
    /// Candidates are the pivot owner's entries of the same kind. Fails with
    /// `EntryNotFound` for an unknown id and `NoEmbedding` if the pivot has
    /// no stored vector; no provider call is made.
    pub async fn find_similar(
        &self,
        entry_id: &str,
        page: PageRequest,
    ) -> MatchResult<PagedResult<RankedMatch>> {
        let span = info_span!("matching.find_similar", entry_id = %entry_id);
        let start = Instant::now();
        let outcome = self
            .find_similar_inner(entry_id, page)
            .instrument(span.clone())
            .await;
        self.finish(MatchOperation::FindSimilar, start, outcome)
            .instrument(span)
            .await
    }

    async fn match_by_attributes_inner(
        &self,
        query: &AttributeQuery,
        cancel: &CancellationToken,
    ) -> MatchResult<(usize, PagedResult<RankedMatch>)> {
        if query.owner_id.trim().is_empty() {
            return Err(MatchError::InvalidRequest(
                "owner_id must not be empty".into(),
            ));
        }
        let page = query
            .page
            .unwrap_or_else(|| PageRequest::first(self.config.default_page_size));
        self.check_page(page)?;

        let predicate = (!query.predicate.is_unconstrained()).then_some(&query.predicate);

        let embed = async {
            match query.text() {
                Some(text) => {
                    let text = query.predicate.query_text(text);
                    self.embed_query(&text, cancel).await.map(Some)
                }
                None => Ok(None),
            }
        };
        let fetch = async {
            self.catalog
                .candidates(&query.owner_id, query.kind, predicate)
                .await
                .map_err(MatchError::from)
        };
        let (query_vector, candidates) = tokio::try_join!(embed, fetch)?;
        let candidates = scoped(candidates, &query.owner_id, query.kind);

        let ranked = self.ranker.rank(
            query_vector.as_ref().map(Embedding::as_slice),
            &candidates,
            predicate,
        )?;
        Ok((candidates.len(), paginate(ranked, page)?))
    }

    async fn find_similar_inner(
        &self,
        entry_id: &str,
        page: PageRequest,
    ) -> MatchResult<(usize, PagedResult<RankedMatch>)> {
        self.check_page(page)?;

        let pivot = self
            .catalog
            .entry(entry_id)
            .await?
            .ok_or_else(|| MatchError::EntryNotFound(entry_id.to_string()))?;
        let Some(pivot_vector) = pivot.embedding.as_ref() else {
            return Err(MatchError::NoEmbedding(pivot.id));
        };

        let candidates = self
            .catalog
            .entries_for_owner(&pivot.owner_id, Some(pivot.kind))
            .await?;
        let candidates = scoped(candidates, &pivot.owner_id, Some(pivot.kind));

        let ranked = self
            .ranker
            .rank(Some(pivot_vector.as_slice()), &candidates, None)?;
        Ok((candidates.len(), paginate_excluding(ranked, &pivot.id, page)?))
    }

    /// Provider call bounded by the configured deadline and the caller's
    /// cancellation token, whichever fires first.
    async fn embed_query(&self, text: &str, cancel: &CancellationToken) -> MatchResult<Embedding> {
        let deadline = self.config.provider_timeout();
        let start = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MatchError::Cancelled),
            outcome = tokio::time::timeout(deadline, self.provider.embed(text)) => match outcome {
                Ok(Ok(embedding)) => Ok(embedding),
                Ok(Err(ProviderError::Timeout)) => Err(MatchError::ProviderTimeout(start.elapsed())),
                Ok(Err(err)) => Err(err.into()),
                Err(_) => Err(MatchError::ProviderTimeout(deadline)),
            },
        }
    }

    fn check_page(&self, page: PageRequest) -> MatchResult<()> {
        page.validate()?;
        match self.config.max_page_size {
            Some(max) if page.page_size > max => Err(MatchError::InvalidPageRequest(format!(
                "page_size {} exceeds max_page_size {max}",
                page.page_size
            ))),
            _ => Ok(()),
        }
    }

    async fn finish(
        &self,
        operation: MatchOperation,
        start: Instant,
        outcome: MatchResult<(usize, PagedResult<RankedMatch>)>,
    ) -> MatchResult<PagedResult<RankedMatch>> {
        let latency: Duration = start.elapsed();
        match outcome {
            Ok((candidates, page)) => {
                info!(
                    operation = operation.as_str(),
                    candidates,
                    total = page.total_count,
                    returned = page.items.len(),
                    page = page.page,
                    elapsed_micros = latency.as_micros(),
                    "match_success"
                );
                if let Some(recorder) = metrics_recorder() {
                    recorder.record_match(operation, latency, page.total_count, page.items.len());
                }
                Ok(page)
            }
            Err(err) => {
                warn!(
                    operation = operation.as_str(),
                    error = %err,
                    elapsed_micros = latency.as_micros(),
                    "match_failure"
                );
                Err(err)
            }
        }
    }
}

/// Drop anything the catalog returned outside the requested owner/kind scope.
fn scoped(entries: Vec<CatalogEntry>, owner_id: &str, kind: Option<EntryKind>) -> Vec<CatalogEntry> {
    entries
        .into_iter()
        .filter(|e| e.owner_id == owner_id && kind.is_none_or(|k| e.kind == k))
        .collect()
}
