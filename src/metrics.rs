//! Process-wide observer for engine operations.
//!
//! Install a [`MatchMetrics`] with [`set_match_metrics`] and every
//! `MatchingEngine` reports one observation per successful
//! `match_by_attributes` or `find_similar` call. Failed calls are only logged.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

/// Which public engine operation produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOperation {
    MatchByAttributes,
    FindSimilar,
}

impl MatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperation::MatchByAttributes => "match_by_attributes",
            MatchOperation::FindSimilar => "find_similar",
        }
    }
}

/// Metrics observer for match operations.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of a match.
    ///
    /// `total_count` is the number of entries that survived filtering and
    /// `returned` the number on the delivered page.
    fn record_match(
        &self,
        operation: MatchOperation,
        latency: Duration,
        total_count: usize,
        returned: usize,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install (`Some`) or remove (`None`) the recorder shared by all engines.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
