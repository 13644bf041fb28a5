use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata attached to ingested documents and retrieved chunks.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Coarse relevance tag attached to each retrieved item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    /// Strong match.
    High,
    /// Partial match.
    Medium,
    /// Weak match.
    Low,
}

/// A piece of reference text returned by a [`ContextProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// The chunk text.
    pub content: String,
    /// Metadata of the chunk (document index, chunk index, caller tags).
    #[serde(default)]
    pub metadata: Metadata,
    /// Relevance tag.
    pub relevance: Relevance,
}

impl ContextItem {
    /// Creates an item with no metadata.
    pub fn new(content: impl Into<String>, relevance: Relevance) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
            relevance,
        }
    }
}

/// Supplies reference text for a query.
///
/// Implementations must not fail outward: internal errors are logged and
/// reported as `0` ingested chunks or an empty result list.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Splits and stores documents, returning the number of chunks created.
    ///
    /// `metadata[i]`, when present, is attached to every chunk of `documents[i]`.
    async fn ingest(&self, documents: &[String], metadata: Option<&[Metadata]>) -> usize;

    /// Returns up to `k` items relevant to `query`, optionally restricted to
    /// chunks whose metadata matches every key of `filter`.
    async fn retrieve(&self, query: &str, k: usize, filter: Option<&Metadata>)
        -> Vec<ContextItem>;
}
