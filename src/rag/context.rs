//! Context building for RAG responses.

use crate::config::{RagSettings, SearchType};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{mmr, ChunkFilter, SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieves the chunks of one video that are relevant to a question.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    search_type: SearchType,
    k: usize,
    fetch_k: usize,
    lambda_mult: f32,
}

impl ContextBuilder {
    /// Create a new context builder with default retrieval parameters.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self::from_settings(vector_store, embedder, &RagSettings::default())
    }

    /// Create a context builder from settings.
    pub fn from_settings(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &RagSettings,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            search_type: settings.search_type,
            k: settings.k,
            fetch_k: settings.fetch_k.max(settings.k),
            lambda_mult: settings.lambda_mult,
        }
    }

    /// Set the number of chunks returned.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self.fetch_k = self.fetch_k.max(k);
        self
    }

    /// Set the ranking strategy.
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Retrieve chunks for a question, restricted to one owner's video.
    #[instrument(skip(self, question))]
    pub async fn build(
        &self,
        owner_id: i64,
        video_id: &str,
        question: &str,
    ) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;
        let filter = ChunkFilter::new(owner_id, video_id);

        let results = match self.search_type {
            SearchType::Similarity => {
                self.vector_store
                    .search(&query_embedding, &filter, self.k)
                    .await?
            }
            SearchType::Mmr => {
                let candidates = self
                    .vector_store
                    .search(&query_embedding, &filter, self.fetch_k)
                    .await?;
                let embeddings: Vec<Vec<f32>> = candidates
                    .iter()
                    .map(|c| c.document.embedding.clone())
                    .collect();

                let picked = mmr::select(&query_embedding, &embeddings, self.k, self.lambda_mult);
                let mut slots: Vec<Option<SearchResult>> =
                    candidates.into_iter().map(Some).collect();
                picked
                    .into_iter()
                    .filter_map(|i| slots.get_mut(i).and_then(Option::take))
                    .collect()
            }
        };

        debug!(
            owner_id,
            video_id,
            chunks = results.len(),
            "Retrieved context"
        );
        Ok(results)
    }
}

/// Join chunk texts into the prompt context, separated by blank lines.
pub fn format_docs(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
