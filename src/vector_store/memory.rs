//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, rank, ChunkFilter, Document, SearchResult, VectorStore};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of documents across all owners.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> TubechatError {
    TubechatError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            store.insert(doc.id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let results: Vec<SearchResult> = docs
            .values()
            .filter(|doc| filter.matches(doc))
            .map(|doc| SearchResult {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .collect();

        Ok(rank(results, limit))
    }

    async fn delete(&self, ids: &[Uuid]) -> Result<usize> {
        let mut docs = self.documents.write().map_err(poisoned)?;
        Ok(ids.iter().filter(|id| docs.remove(*id).is_some()).count())
    }

    async fn count(&self, filter: &ChunkFilter) -> Result<usize> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(docs.values().filter(|d| filter.matches(d)).count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::doc;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = doc(1, "video1", 0, vec![1.0, 0.0, 0.0]);
        let doc2 = doc(1, "video1", 1, vec![0.0, 1.0, 0.0]);

        store.upsert_batch(&[doc1.clone(), doc2]).await.unwrap();

        let filter = ChunkFilter::new(1, "video1");
        assert_eq!(store.count(&filter).await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].document.id, doc1.id);

        // Same ids replace rather than duplicate
        store.upsert_batch(&[doc1.clone()]).await.unwrap();
        assert_eq!(store.len(), 2);

        assert_eq!(store.delete(&[doc1.id, Uuid::new_v4()]).await.unwrap(), 1);
        assert_eq!(store.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_owner_and_video() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                doc(1, "shared", 0, vec![1.0, 0.0]),
                doc(2, "shared", 0, vec![1.0, 0.0]),
                doc(1, "other", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filter = ChunkFilter::new(2, "shared");
        let results = store.search(&[1.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.owner_id, 2);
        assert_eq!(results[0].document.video_id, "shared");
    }
}
