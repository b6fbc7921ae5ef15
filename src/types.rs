use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-length vector produced by an external embedding provider.
///
/// The dimension is constant across a catalog. The engine never pads or
/// truncates; a disagreement surfaces as
/// [`MatchError::DimensionMismatch`](crate::MatchError::DimensionMismatch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self(vector)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(value: Vec<f32>) -> Self {
        Self(value)
    }
}

/// Whether a catalog entry is a single clothing item or a composed outfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Item,
    Outfit,
}

/// Named attributes that attribute predicates are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryAttributes {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// The unit being ranked: a clothing item or an outfit.
///
/// The engine only ever reads entries; embedding computation and
/// invalidation belong to whoever owns persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque, stable identifier. Used as the last tie-break key.
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub attributes: EntryAttributes,
    /// Absent until an embedding provider call has succeeded for this entry.
    #[serde(default)]
    pub embedding: Option<Embedding>,
    /// Only used as a tie-break key; newer entries rank first among equals.
    pub created_at: DateTime<Utc>,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: EntryKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind,
            attributes: EntryAttributes::default(),
            embedding: None,
            created_at,
        }
    }

    pub fn with_attributes(mut self, attributes: EntryAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_embedding(mut self, embedding: impl Into<Embedding>) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    /// Text an embedding collaborator should embed for this entry.
    ///
    /// Same shape as the query text the engine composes, so entry and query
    /// vectors come from comparable inputs: description first, then
    /// category, color, brand, material, and tags in sorted order.
    pub fn embedding_text(&self) -> String {
        let a = &self.attributes;
        compose_text(
            a.description.as_deref(),
            [
                a.category.as_deref(),
                a.color.as_deref(),
                a.brand.as_deref(),
                a.material.as_deref(),
            ],
            a.tags.iter().map(String::as_str),
        )
    }
}

/// Joins the non-blank fragments with single spaces.
pub(crate) fn compose_text<'a>(
    lead: Option<&'a str>,
    fields: [Option<&'a str>; 4],
    tags: impl Iterator<Item = &'a str>,
) -> String {
    std::iter::once(lead)
        .chain(fields)
        .flatten()
        .chain(tags)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
