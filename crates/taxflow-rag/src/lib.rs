//! Retrieval backend for tax rules, forms and taxpayer documents.
//!
//! Provides recursive text splitting, local embedding generation, an
//! in-memory vector store with metadata filters, and [`TaxDocumentRag`],
//! the [`taxflow_core::ContextProvider`] every agent consults.
//!
//! # Main types
//!
//! - [`TaxDocumentRag`]: ingest, retrieve, delete and inspect chunks.
//! - [`TextSplitter`]: recursive character splitter with overlap.
//! - [`VectorStore`]: trait for storing and querying embedding vectors.
//! - [`LocalEmbedding`]: feature-hashing embedding provider.
//! - [`load_documents_from_dir`]: reads a document tree for ingestion.

/// Embedding provider trait and local implementation.
pub mod embedding;
/// Directory loading and filename helpers.
pub mod loader;
/// The retrieval backend.
pub mod rag;
/// Recursive text splitter.
pub mod splitter;
/// Vector store trait and in-memory implementation.
pub mod store;

pub use embedding::{EmbeddingProvider, LocalEmbedding};
pub use loader::{
    extract_tax_year, load_documents_from_dir, sanitize_filename, LoadedDocument,
    DEFAULT_EXTENSIONS,
};
pub use rag::{relevance_for, RagConfig, RagStats, TaxDocumentRag};
pub use splitter::TextSplitter;
pub use store::{ChunkEntry, InMemoryVectorStore, ScoredChunk, VectorStore};
