//! Collaborator contracts the engine consumes.
//!
//! - [`EmbeddingProvider`] turns text into an [`Embedding`]; the only call
//!   on the query path that can block, fail transiently, or be cancelled.
//! - [`CatalogSource`] hands out read-only snapshots of catalog entries.
//!   The engine never writes through it.
//!
//! [`InMemoryCatalog`] is a ready-made source over entries the caller
//! already holds in memory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CatalogError, ProviderError};
use crate::filter::{AttributePredicate, matches};
use crate::types::{CatalogEntry, Embedding, EntryKind};

/// Text to vector, backed by an external model or API.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError>;

    /// Identifier used in logs.
    fn name(&self) -> &str {
        "embedding-provider"
    }
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        (**self).embed(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Read-only access to catalog entries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All entries owned by `owner_id`, optionally restricted to one kind.
    async fn entries_for_owner(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Look up a single entry by id.
    async fn entry(&self, entry_id: &str) -> Result<Option<CatalogEntry>, CatalogError>;

    /// Candidate pool for an attribute query.
    ///
    /// Sources backed by a real store may push the predicate down; the
    /// engine re-applies it either way, so returning a superset is fine.
    async fn candidates(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
        _predicate: Option<&AttributePredicate>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.entries_for_owner(owner_id, kind).await
    }
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    async fn entries_for_owner(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        (**self).entries_for_owner(owner_id, kind).await
    }

    async fn entry(&self, entry_id: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        (**self).entry(entry_id).await
    }

    async fn candidates(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
        predicate: Option<&AttributePredicate>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        (**self).candidates(owner_id, kind, predicate).await
    }
}

/// Catalog over an owned, immutable snapshot of entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn owned_by<'a>(
        &'a self,
        owner_id: &'a str,
        kind: Option<EntryKind>,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.owner_id == owner_id && kind.is_none_or(|k| e.kind == k))
    }
}

impl FromIterator<CatalogEntry> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn entries_for_owner(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.owned_by(owner_id, kind).cloned().collect())
    }

    async fn entry(&self, entry_id: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        Ok(self.entries.iter().find(|e| e.id == entry_id).cloned())
    }

    async fn candidates(
        &self,
        owner_id: &str,
        kind: Option<EntryKind>,
        predicate: Option<&AttributePredicate>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self
            .owned_by(owner_id, kind)
            .filter(|e| predicate.is_none_or(|p| matches(e, p)))
            .cloned()
            .collect())
    }
}
