use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taxflow_core::{Metadata, TaxflowError, TaxflowResult};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A single embedded chunk stored in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    /// Unique chunk id.
    pub id: Uuid,
    /// Chunk text.
    pub content: String,
    /// Embedding of `content`.
    pub embedding: Vec<f32>,
    /// Document-level metadata plus `doc_index` / `chunk_index`.
    pub metadata: Metadata,
    /// Ingestion time.
    pub created_at: DateTime<Utc>,
}

impl ChunkEntry {
    /// Creates an entry with a fresh id.
    pub fn new(content: impl Into<String>, embedding: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            embedding,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// A chunk with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The stored chunk.
    pub entry: ChunkEntry,
    /// Cosine similarity to the query embedding.
    pub score: f32,
}

/// Trait for vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a chunk.
    async fn insert(&self, entry: ChunkEntry) -> TaxflowResult<()>;

    /// Top-k chunks most similar to `query_embedding`, restricted to chunks
    /// whose metadata contains every key/value pair of `filter`.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Metadata>,
    ) -> TaxflowResult<Vec<ScoredChunk>>;

    /// Delete every chunk matching `filter`, returning how many were removed.
    async fn delete_where(&self, filter: &Metadata) -> TaxflowResult<usize>;

    /// Delete the chunks with the given ids, returning how many were removed.
    async fn delete(&self, ids: &[Uuid]) -> TaxflowResult<usize>;

    /// Number of stored chunks.
    async fn count(&self) -> TaxflowResult<usize>;
}

/// In-memory vector store using brute-force cosine similarity.
/// Suitable for the rule and form corpora a single filing session needs.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<ChunkEntry>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, entry: ChunkEntry) -> TaxflowResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Metadata>,
    ) -> TaxflowResult<Vec<ScoredChunk>> {
        if query_embedding.is_empty() {
            return Err(TaxflowError::Retrieval("empty query embedding".to_string()));
        }

        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .filter(|e| filter.map_or(true, |f| metadata_matches(&e.metadata, f)))
            .map(|e| ScoredChunk {
                score: cosine_similarity(query_embedding, &e.embedding),
                entry: e.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn delete_where(&self, filter: &Metadata) -> TaxflowResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !metadata_matches(&e.metadata, filter));
        Ok(before - entries.len())
    }

    async fn delete(&self, ids: &[Uuid]) -> TaxflowResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !ids.contains(&e.id));
        Ok(before - entries.len())
    }

    async fn count(&self) -> TaxflowResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// True when `metadata` holds every key/value pair of `filter`.
pub(crate) fn metadata_matches(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(k, v)| metadata.get(k) == Some(v))
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
