//! Hard attribute predicates evaluated before similarity ranking.
//!
//! Every field of [`AttributePredicate`] is optional and an absent field
//! imposes no constraint. Present fields are combined with logical AND:
//!
//! - `category`, `color`, `brand`, `material`: case-insensitive exact match.
//! - `tags`: the entry's tag set must intersect the predicate's tag set
//!   (case-insensitive). An empty predicate set imposes no constraint.
//! - `description`: case-insensitive substring of the entry description.
//!
//! An entry lacking an attribute never satisfies a predicate on it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{CatalogEntry, compose_text};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributePredicate {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AttributePredicate {
    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = Some(value.into());
        self
    }

    pub fn color(mut self, value: impl Into<String>) -> Self {
        self.color = Some(value.into());
        self
    }

    pub fn brand(mut self, value: impl Into<String>) -> Self {
        self.brand = Some(value.into());
        self
    }

    pub fn material(mut self, value: impl Into<String>) -> Self {
        self.material = Some(value.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    /// True when no field constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.category.is_none()
            && self.color.is_none()
            && self.brand.is_none()
            && self.material.is_none()
            && self.tags.as_ref().is_none_or(BTreeSet::is_empty)
            && self.description.is_none()
    }

    /// Text used to derive a query embedding: the free text first, then the
    /// attribute values in the same order as
    /// [`CatalogEntry::embedding_text`].
    pub(crate) fn query_text(&self, free_text: &str) -> String {
        compose_text(
            Some(free_text),
            [
                self.category.as_deref(),
                self.color.as_deref(),
                self.brand.as_deref(),
                self.material.as_deref(),
            ],
            self.tags.iter().flatten().map(String::as_str),
        )
    }
}

/// Evaluate `predicate` against `entry`. Pure; no allocation on the
/// exact-match paths.
pub fn matches(entry: &CatalogEntry, predicate: &AttributePredicate) -> bool {
    let attrs = &entry.attributes;

    field_matches(attrs.category.as_deref(), predicate.category.as_deref())
        && field_matches(attrs.color.as_deref(), predicate.color.as_deref())
        && field_matches(attrs.brand.as_deref(), predicate.brand.as_deref())
        && field_matches(attrs.material.as_deref(), predicate.material.as_deref())
        && tags_intersect(&attrs.tags, predicate.tags.as_ref())
        && description_contains(attrs.description.as_deref(), predicate.description.as_deref())
}

fn field_matches(actual: Option<&str>, wanted: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wanted), Some(actual)) => actual.eq_ignore_ascii_case(wanted) || {
            // Full Unicode folding only when ASCII comparison cannot decide.
            !(actual.is_ascii() && wanted.is_ascii())
                && actual.to_lowercase() == wanted.to_lowercase()
        },
    }
}

fn tags_intersect(actual: &BTreeSet<String>, wanted: Option<&BTreeSet<String>>) -> bool {
    let Some(wanted) = wanted.filter(|w| !w.is_empty()) else {
        return true;
    };
    wanted.iter().any(|w| {
        actual.contains(w)
            || actual
                .iter()
                .any(|a| field_matches(Some(a.as_str()), Some(w.as_str())))
    })
}

fn description_contains(actual: Option<&str>, needle: Option<&str>) -> bool {
    match (needle, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(needle), Some(haystack)) => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
    }
}
