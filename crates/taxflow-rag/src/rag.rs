use crate::embedding::{EmbeddingProvider, LocalEmbedding};
use crate::splitter::TextSplitter;
use crate::store::{ChunkEntry, InMemoryVectorStore, ScoredChunk, VectorStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taxflow_core::{ContextItem, ContextProvider, Metadata, Relevance, TaxflowResult};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Chunking and embedding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Dimension of the local embedding vectors.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_embedding_dimension() -> usize {
    256
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

/// Snapshot of the retrieval backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagStats {
    /// Configured chunk size.
    pub chunk_size: usize,
    /// Configured chunk overlap.
    pub chunk_overlap: usize,
    /// Chunks currently stored.
    pub chunk_count: usize,
    /// Embedding vector dimension.
    pub embedding_dimension: usize,
}

/// Retrieval backend over tax rules, forms and taxpayer documents.
///
/// Documents are split with [`TextSplitter`], embedded and kept in a
/// [`VectorStore`]. The [`ContextProvider`] impl never fails outward.
pub struct TaxDocumentRag {
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl TaxDocumentRag {
    /// Builds a backend with the local embedding and an in-memory store.
    pub fn new(config: &RagConfig) -> TaxflowResult<Self> {
        Self::with_backends(
            config,
            Arc::new(LocalEmbedding::new(config.embedding_dimension)),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    /// Builds a backend over caller-supplied embedding and storage.
    pub fn with_backends(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> TaxflowResult<Self> {
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        info!(
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            dimension = embedder.dimension(),
            "RAG backend initialized"
        );
        Ok(Self {
            splitter,
            embedder,
            store,
        })
    }

    /// Splits, embeds and stores `documents`, returning the number of chunks.
    ///
    /// Every chunk of `documents[i]` carries `metadata[i]` (when given) plus
    /// `doc_index` and `chunk_index`. Ingestion is all or nothing: on any
    /// failure the chunks already stored by this call are removed again.
    pub async fn ingest_documents(
        &self,
        documents: &[String],
        metadata: Option<&[Metadata]>,
    ) -> TaxflowResult<usize> {
        if documents.is_empty() {
            warn!("No documents provided for ingestion");
            return Ok(0);
        }

        let mut stored = Vec::new();
        if let Err(e) = self.store_chunks(documents, metadata, &mut stored).await {
            match self.store.delete(&stored).await {
                Ok(removed) => warn!(removed, "Rolled back partial ingestion"),
                Err(rollback) => error!(
                    error = %rollback,
                    orphaned = stored.len(),
                    "Failed to roll back partial ingestion"
                ),
            }
            return Err(e);
        }

        info!(
            chunks = stored.len(),
            documents = documents.len(),
            "Ingested documents"
        );
        Ok(stored.len())
    }

    async fn store_chunks(
        &self,
        documents: &[String],
        metadata: Option<&[Metadata]>,
        stored: &mut Vec<Uuid>,
    ) -> TaxflowResult<()> {
        for (doc_index, text) in documents.iter().enumerate() {
            let chunks = self.splitter.split_text(text);
            if chunks.is_empty() {
                debug!(doc_index, "Document produced no chunks");
                continue;
            }

            let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
            let embeddings = self.embedder.embed_batch(&refs).await?;

            let base = metadata
                .and_then(|m| m.get(doc_index))
                .cloned()
                .unwrap_or_default();

            for (chunk_index, (chunk, embedding)) in
                chunks.into_iter().zip(embeddings).enumerate()
            {
                let mut chunk_metadata = base.clone();
                chunk_metadata.insert("doc_index".into(), doc_index.into());
                chunk_metadata.insert("chunk_index".into(), chunk_index.into());
                let entry = ChunkEntry::new(chunk, embedding, chunk_metadata);
                let id = entry.id;
                self.store.insert(entry).await?;
                stored.push(id);
            }
        }
        Ok(())
    }

    /// Top-k chunks for `query` together with their similarity scores.
    pub async fn retrieve_with_scores(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Metadata>,
    ) -> TaxflowResult<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&embedding, k, filter).await?;
        debug!(query, k, hits = results.len(), "Retrieved chunks");
        Ok(results)
    }

    /// Removes every chunk whose metadata matches `filter`.
    pub async fn delete_documents(&self, filter: &Metadata) -> TaxflowResult<usize> {
        let removed = self.store.delete_where(filter).await?;
        info!(removed, "Deleted chunks matching filter");
        Ok(removed)
    }

    /// Current configuration and chunk count.
    pub async fn stats(&self) -> TaxflowResult<RagStats> {
        Ok(RagStats {
            chunk_size: self.splitter.chunk_size(),
            chunk_overlap: self.splitter.chunk_overlap(),
            chunk_count: self.store.count().await?,
            embedding_dimension: self.embedder.dimension(),
        })
    }
}

/// Maps a cosine score onto the coarse relevance tag.
pub fn relevance_for(score: f32) -> Relevance {
    if score >= 0.5 {
        Relevance::High
    } else if score >= 0.2 {
        Relevance::Medium
    } else {
        Relevance::Low
    }
}

#[async_trait]
impl ContextProvider for TaxDocumentRag {
    async fn ingest(&self, documents: &[String], metadata: Option<&[Metadata]>) -> usize {
        match self.ingest_documents(documents, metadata).await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Failed to ingest documents");
                0
            }
        }
    }

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Vec<ContextItem> {
        match self.retrieve_with_scores(query, k, filter).await {
            Ok(results) => results
                .into_iter()
                .map(|r| ContextItem {
                    relevance: relevance_for(r.score),
                    content: r.entry.content,
                    metadata: r.entry.metadata,
                })
                .collect(),
            Err(e) => {
                error!(error = %e, "Failed to retrieve documents");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_rag() -> TaxDocumentRag {
        TaxDocumentRag::new(&RagConfig {
            chunk_size: 200,
            chunk_overlap: 20,
            embedding_dimension: 128,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config: RagConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            embedding_dimension: 64,
        };
        assert!(TaxDocumentRag::new(&config).is_err());
    }

    /// Local embedding that refuses any text mentioning "POISON".
    struct RefusingEmbedding(LocalEmbedding);

    #[async_trait]
    impl EmbeddingProvider for RefusingEmbedding {
        async fn embed(&self, text: &str) -> TaxflowResult<Vec<f32>> {
            if text.contains("POISON") {
                return Err(taxflow_core::TaxflowError::Retrieval("embedding refused".into()));
            }
            self.0.embed(text).await
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }
    }

    #[tokio::test]
    async fn test_failed_ingest_leaves_no_chunks() {
        let store = Arc::new(InMemoryVectorStore::new());
        let rag = TaxDocumentRag::with_backends(
            &RagConfig::default(),
            Arc::new(RefusingEmbedding(LocalEmbedding::new(64))),
            store.clone(),
        )
        .unwrap();
        let docs = vec![
            "Form W-2 reports wages and withholding.".to_string(),
            "Schedule C profit or loss. POISON".to_string(),
        ];

        assert!(rag.ingest_documents(&docs, None).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(ContextProvider::ingest(&rag, &docs, None).await, 0);
        assert_eq!(rag.stats().await.unwrap().chunk_count, 0);

        // A clean batch afterwards is stored in full.
        assert_eq!(rag.ingest_documents(&docs[..1], None).await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[test]
    fn test_relevance_thresholds() {
        assert_eq!(relevance_for(0.9), Relevance::High);
        assert_eq!(relevance_for(0.5), Relevance::High);
        assert_eq!(relevance_for(0.3), Relevance::Medium);
        assert_eq!(relevance_for(0.2), Relevance::Medium);
        assert_eq!(relevance_for(0.1), Relevance::Low);
    }

    #[tokio::test]
    async fn test_ingest_stamps_indices() {
        let rag = small_rag();
        let mut meta = Metadata::new();
        meta.insert("source".into(), json!("irs_pub_17"));

        let metas = vec![meta];
        let count = rag
            .ingest_documents(
                &["Standard deduction rules".to_string(), "Schedule C".to_string()],
                Some(metas.as_slice()),
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let hits = rag
            .retrieve_with_scores("standard deduction rules", 5, None)
            .await
            .unwrap();
        let first = &hits[0].entry;
        assert_eq!(first.content, "Standard deduction rules");
        assert_eq!(first.metadata["doc_index"], 0);
        assert_eq!(first.metadata["chunk_index"], 0);
        assert_eq!(first.metadata["source"], "irs_pub_17");

        let second = hits.iter().find(|h| h.entry.content == "Schedule C").unwrap();
        assert_eq!(second.entry.metadata["doc_index"], 1);
        assert!(second.entry.metadata.get("source").is_none());
    }

    #[tokio::test]
    async fn test_empty_document_list() {
        let rag = small_rag();
        assert_eq!(rag.ingest(&[], None).await, 0);
        assert_eq!(rag.stats().await.unwrap().chunk_count, 0);
    }

    #[tokio::test]
    async fn test_retrieve_exact_text_is_high() {
        let rag = small_rag();
        rag.ingest(
            &[
                "Schedule C reports profit or loss from business".to_string(),
                "Form 8863 claims education credits".to_string(),
            ],
            None,
        )
        .await;

        let items = rag
            .retrieve("Schedule C reports profit or loss from business", 1, None)
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].relevance, Relevance::High);
        assert!(items[0].content.starts_with("Schedule C"));
    }

    #[tokio::test]
    async fn test_retrieve_failure_degrades_to_empty() {
        let rag = small_rag();
        rag.ingest(&["Form W-2 wage statement".to_string()], None).await;
        assert!(rag.retrieve("   ", 3, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_and_delete() {
        let rag = small_rag();
        rag.ingest(
            &["Federal filing rules".to_string(), "State filing rules".to_string()],
            None,
        )
        .await;

        let mut filter = Metadata::new();
        filter.insert("doc_index".into(), json!(1));

        let items = rag.retrieve("filing rules", 5, Some(&filter)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "State filing rules");

        assert_eq!(rag.delete_documents(&filter).await.unwrap(), 1);
        let stats = rag.stats().await.unwrap();
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.embedding_dimension, 128);
        assert_eq!(stats.chunk_size, 200);
    }
}
