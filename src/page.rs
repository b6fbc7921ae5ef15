//! Page slicing over an already-ordered sequence.
//!
//! Requests are validated, never clamped: `page >= 1` and `page_size >= 1`,
//! otherwise [`MatchError::InvalidPageRequest`]. A page past the end is a
//! valid, empty page that still reports the full `total_count`.

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};
use crate::types::CatalogEntry;

/// Anything with a stable identifier, so neighborhood paging can drop the pivot.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for CatalogEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// First page of the given size.
    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }

    pub fn validate(&self) -> MatchResult<()> {
        if self.page == 0 {
            return Err(MatchError::InvalidPageRequest(
                "page must be >= 1".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(MatchError::InvalidPageRequest(
                "page_size must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Offset of the first element on this page, saturating on overflow so an
    /// absurd page number just lands past the end.
    fn start(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Items that survived filtering, before slicing.
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Slice `ordered` into the requested page.
pub fn paginate<T>(ordered: Vec<T>, request: PageRequest) -> MatchResult<PagedResult<T>> {
    request.validate()?;

    let total_count = ordered.len();
    let start = request.start();
    let items = if start >= total_count {
        Vec::new()
    } else {
        ordered
            .into_iter()
            .skip(start)
            .take(request.page_size)
            .collect()
    };

    Ok(PagedResult {
        items,
        total_count,
        page: request.page,
        page_size: request.page_size,
    })
}

/// Neighborhood mode: drop the pivot, then page. An entry is never its own
/// neighbor, and the pivot does not count towards `total_count`.
pub fn paginate_excluding<T: Identified>(
    ordered: Vec<T>,
    pivot_id: &str,
    request: PageRequest,
) -> MatchResult<PagedResult<T>> {
    request.validate()?;
    let neighbors = ordered
        .into_iter()
        .filter(|item| item.id() != pivot_id)
        .collect();
    paginate(neighbors, request)
}
