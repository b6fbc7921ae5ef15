//! Shared fakes and fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing_subscriber::EnvFilter;
use wardrobe_match::{
    CatalogEntry, Embedding, EmbeddingProvider, EntryAttributes, EntryKind, InMemoryCatalog,
    ProviderError,
};

static TRACING: Once = Once::new();

/// Route engine logs through the test harness; `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Looks the text up in a fixed table, falling back to a default vector.
pub struct KeywordProvider {
    table: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: AtomicUsize,
}

impl KeywordProvider {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            table: HashMap::new(),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vector = self.table.get(text).unwrap_or(&self.fallback);
        Ok(Embedding::new(vector.clone()))
    }

    fn name(&self) -> &str {
        "keyword-fake"
    }
}

/// Fails every call with the configured error.
pub struct DownProvider(pub ProviderError);

#[async_trait]
impl EmbeddingProvider for DownProvider {
    async fn embed(&self, _text: &str) -> Result<Embedding, ProviderError> {
        Err(self.0.clone())
    }
}

/// Answers after a fixed delay.
pub struct SlowProvider(pub Duration);

#[async_trait]
impl EmbeddingProvider for SlowProvider {
    async fn embed(&self, _text: &str) -> Result<Embedding, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(Embedding::new(vec![1.0, 0.0, 0.0]))
    }
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn item(
    id: &str,
    owner: &str,
    category: &str,
    color: &str,
    created: DateTime<Utc>,
) -> CatalogEntry {
    CatalogEntry::new(id, owner, EntryKind::Item, created).with_attributes(EntryAttributes {
        category: Some(category.into()),
        color: Some(color.into()),
        ..Default::default()
    })
}

/// A small three-dimensional wardrobe for two owners.
pub fn sample_catalog() -> InMemoryCatalog {
    let mut entries = vec![
        item("jacket-navy", "alice", "jacket", "navy", day(2023, 3, 1))
            .with_embedding(vec![0.9, 0.1, 0.0]),
        item("jacket-black", "alice", "jacket", "black", day(2023, 2, 1))
            .with_embedding(vec![0.8, 0.2, 0.1]),
        item("tee-white", "alice", "tshirt", "white", day(2023, 4, 1))
            .with_embedding(vec![0.1, 0.9, 0.2]),
        item("jeans-blue", "alice", "jeans", "blue", day(2023, 1, 15))
            .with_embedding(vec![0.0, 0.3, 0.95]),
        item("scarf-navy", "alice", "scarf", "navy", day(2023, 5, 1)),
        item("jacket-green", "bob", "jacket", "green", day(2023, 3, 5))
            .with_embedding(vec![1.0, 0.0, 0.0]),
    ];
    entries.extend([
        CatalogEntry::new("outfit-office", "alice", EntryKind::Outfit, day(2023, 6, 1))
            .with_embedding(vec![0.7, 0.3, 0.2]),
        CatalogEntry::new("outfit-weekend", "alice", EntryKind::Outfit, day(2023, 6, 2))
            .with_embedding(vec![0.2, 0.8, 0.5]),
        CatalogEntry::new("outfit-meeting", "alice", EntryKind::Outfit, day(2023, 6, 3))
            .with_embedding(vec![0.75, 0.25, 0.2]),
        CatalogEntry::new("outfit-draft", "alice", EntryKind::Outfit, day(2023, 6, 4)),
    ]);
    InMemoryCatalog::new(entries)
}

/// `count` embedded items for one owner with plenty of exact score ties.
pub fn bulk_catalog(owner: &str, count: usize) -> InMemoryCatalog {
    let colors = ["navy", "black", "white", "red"];
    (0..count)
        .map(|i| {
            let bucket = (i % 7) as f32;
            item(
                &format!("bulk-{i:05}"),
                owner,
                "shirt",
                colors[i % colors.len()],
                day(2022, 1 + (i % 12) as u32, 1 + (i % 3) as u32),
            )
            .with_embedding(vec![1.0, bucket, 0.5])
        })
        .collect()
}
