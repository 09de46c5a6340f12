//! Vector store abstraction for Tubechat.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every query is scoped by a [`ChunkFilter`] so one tenant's chunks are never
//! visible to another.

mod memory;
pub mod mmr;
mod pinecone;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use pinecone::PineconeVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::ContentChunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic chunk ids.
const CHUNK_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4b7d_4e39_9a51_0c3d_7e2f_8b64);

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Entry id, derived from owner, video and chunk order.
    pub id: Uuid,
    /// Owner (user id) the chunk belongs to.
    pub owner_id: i64,
    /// Platform video id.
    pub video_id: String,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the transcript.
    pub chunk_order: i32,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document for an embedded chunk.
    pub fn new(chunk: ContentChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: document_id(chunk.owner_id, &chunk.video_id, chunk.order),
            owner_id: chunk.owner_id,
            video_id: chunk.video_id,
            content: chunk.content,
            chunk_order: chunk.order,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// Deterministic id for a chunk, so re-indexing a video overwrites its entries.
pub fn document_id(owner_id: i64, video_id: &str, chunk_order: i32) -> Uuid {
    Uuid::new_v5(
        &CHUNK_ID_NAMESPACE,
        format!("{}:{}:{}", owner_id, video_id, chunk_order).as_bytes(),
    )
}

/// Metadata filter applied to every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFilter {
    pub owner_id: i64,
    pub video_id: String,
}

impl ChunkFilter {
    pub fn new(owner_id: i64, video_id: impl Into<String>) -> Self {
        Self {
            owner_id,
            video_id: video_id.into(),
        }
    }

    /// Whether a document passes the filter.
    pub fn matches(&self, doc: &Document) -> bool {
        doc.owner_id == self.owner_id && doc.video_id == self.video_id
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document, embedding included.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert documents, replacing entries with the same id.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Most similar documents passing the filter, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Delete documents by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[Uuid]) -> Result<usize>;

    /// Number of documents passing the filter.
    async fn count(&self, filter: &ChunkFilter) -> Result<usize>;

    /// Backend name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort results by descending score and keep the best `limit`.
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn doc(owner_id: i64, video_id: &str, order: i32, embedding: Vec<f32>) -> Document {
        Document::new(
            ContentChunk {
                owner_id,
                video_id: video_id.to_string(),
                content: format!("{} chunk {} of user {}", video_id, order, owner_id),
                order,
            },
            embedding,
        )
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_document_ids_are_deterministic() {
        assert_eq!(document_id(1, "abc123XYZ_9", 0), document_id(1, "abc123XYZ_9", 0));
        assert_ne!(document_id(1, "abc123XYZ_9", 0), document_id(2, "abc123XYZ_9", 0));
        assert_ne!(document_id(1, "abc123XYZ_9", 0), document_id(1, "abc123XYZ_9", 1));
    }

    #[test]
    fn test_filter_matches_owner_and_video() {
        let filter = ChunkFilter::new(1, "vid");
        assert!(filter.matches(&doc(1, "vid", 0, vec![1.0])));
        assert!(!filter.matches(&doc(2, "vid", 0, vec![1.0])));
        assert!(!filter.matches(&doc(1, "other", 0, vec![1.0])));
    }
}
