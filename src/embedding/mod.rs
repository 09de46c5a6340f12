//! Embedding generation for transcript chunks and questions.
//!
//! Ingest embeds every chunk of a video with one `embed_batch` call; a chat turn
//! embeds its question with `embed`. Both must use the same model so the vectors
//! share a space.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns text into vectors for the index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single question.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed all chunks of a transcript, one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every returned vector.
    fn dimensions(&self) -> usize;
}
