//! Similarity matching and recommendation over a wardrobe catalog.
//!
//! The crate ranks clothing items and outfits by cosine similarity of their
//! embeddings, combined with hard attribute filters, and hands back
//! deterministic, paginated results. Embedding generation and persistence
//! stay outside: callers plug in an [`EmbeddingProvider`] and a
//! [`CatalogSource`].
//!
//! Layers, leaves first:
//!
//! - [`vector`]: dot product, magnitude, cosine similarity.
//! - [`filter`]: attribute predicates.
//! - [`rank`]: filter, score and totally order a candidate snapshot.
//! - [`page`]: page slicing and neighborhood mode.
//! - [`engine`]: the [`MatchingEngine`] entry point tying them together.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wardrobe_match::{
//!     AttributePredicate, AttributeQuery, CancellationToken, EmbeddingProvider,
//!     InMemoryCatalog, MatchingEngine,
//! };
//!
//! # async fn demo(provider: Arc<dyn EmbeddingProvider>, catalog: InMemoryCatalog)
//! #     -> Result<(), wardrobe_match::MatchError> {
//! let engine = MatchingEngine::with_defaults(provider, Arc::new(catalog));
//! let query = AttributeQuery::new("user-1")
//!     .with_predicate(AttributePredicate::default().color("navy"))
//!     .with_text("light summer jacket");
//! let page = engine.match_by_attributes(&query, &CancellationToken::new()).await?;
//! for hit in &page.items {
//!     println!("{} {:.3}", hit.entry_id, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod page;
pub mod provider;
pub mod rank;
pub mod retry;
pub mod types;
pub mod vector;

pub use config::{ConfigLoadError, EngineConfig, RetryYamlConfig};
pub use engine::{AttributeQuery, MatchingEngine};
pub use error::{CatalogError, MatchError, MatchResult, ProviderError};
pub use filter::{AttributePredicate, matches};
pub use metrics::{MatchMetrics, MatchOperation, set_match_metrics};
pub use page::{Identified, PageRequest, PagedResult, paginate, paginate_excluding};
pub use provider::{CatalogSource, EmbeddingProvider, InMemoryCatalog};
pub use rank::{CandidateRanker, DEFAULT_PARALLEL_THRESHOLD, RankedMatch, compare_matches};
pub use retry::{RetryConfig, RetryingProvider};
pub use types::{CatalogEntry, Embedding, EntryAttributes, EntryKind};
pub use vector::{cosine_similarity, dot, magnitude};

pub use tokio_util::sync::CancellationToken;
