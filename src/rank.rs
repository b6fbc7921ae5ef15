//! Filter-then-score ranking over an in-memory candidate snapshot.
//!
//! Output order is a total order: score descending, then `created_at`
//! descending, then `id` ascending. The ranker never truncates; paging is
//! the caller's job (see [`crate::page`]).

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::MatchResult;
use crate::filter::{AttributePredicate, matches};
use crate::page::Identified;
use crate::types::CatalogEntry;
use crate::vector::cosine_similarity;

/// Candidate count at which scoring and sorting move onto the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// One scored candidate. Produced fresh per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub entry_id: String,
    /// Cosine similarity in `[-1.0, 1.0]`; `0.0` when either side has no vector.
    pub score: f32,
    pub entry: CatalogEntry,
}

impl Identified for RankedMatch {
    fn id(&self) -> &str {
        &self.entry_id
    }
}

/// The ranking total order: score desc, `created_at` desc, id asc.
pub fn compare_matches(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        .then_with(|| a.entry_id.cmp(&b.entry_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRanker {
    parallel_threshold: usize,
    include_unembedded: bool,
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            include_unembedded: true,
        }
    }
}

impl CandidateRanker {
    pub fn new(parallel_threshold: usize, include_unembedded: bool) -> Self {
        Self {
            parallel_threshold: parallel_threshold.max(1),
            include_unembedded,
        }
    }

    /// Rank `candidates` against `query`.
    ///
    /// With `query == None` every retained candidate scores `0.0` and the
    /// order falls back to the tie-break keys. Candidates without an
    /// embedding score `0.0` unless the ranker was built to drop them.
    ///
    /// Fails with `DimensionMismatch` if any retained candidate's stored
    /// embedding disagrees with the query dimension.
    pub fn rank(
        &self,
        query: Option<&[f32]>,
        candidates: &[CatalogEntry],
        predicate: Option<&AttributePredicate>,
    ) -> MatchResult<Vec<RankedMatch>> {
        let start = Instant::now();
        let parallel = candidates.len() >= self.parallel_threshold;
        let retain = |entry: &&CatalogEntry| predicate.is_none_or(|p| matches(entry, p));

        let mut ranked: Vec<RankedMatch> = if parallel {
            candidates
                .par_iter()
                .filter(retain)
                .filter_map(|entry| self.score(query, entry).transpose())
                .collect::<MatchResult<_>>()?
        } else {
            candidates
                .iter()
                .filter(retain)
                .filter_map(|entry| self.score(query, entry).transpose())
                .collect::<MatchResult<_>>()?
        };

        // Ids are unique within a snapshot, so the order is total and an
        // unstable sort is deterministic.
        if parallel {
            ranked.par_sort_unstable_by(compare_matches);
        } else {
            ranked.sort_unstable_by(compare_matches);
        }

        debug!(
            candidates = candidates.len(),
            retained = ranked.len(),
            parallel,
            has_query = query.is_some(),
            elapsed_micros = start.elapsed().as_micros(),
            "rank_complete"
        );
        Ok(ranked)
    }

    fn score(
        &self,
        query: Option<&[f32]>,
        entry: &CatalogEntry,
    ) -> MatchResult<Option<RankedMatch>> {
        let score = match (query, entry.embedding.as_ref()) {
            (_, None) if !self.include_unembedded => return Ok(None),
            (Some(q), Some(embedding)) => cosine_similarity(q, embedding.as_slice())?,
            _ => 0.0,
        };
        Ok(Some(RankedMatch {
            entry_id: entry.id.clone(),
            score,
            entry: entry.clone(),
        }))
    }
}
