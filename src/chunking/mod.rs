//! Transcript chunking for semantic retrieval.
//!
//! Transcripts are split into fixed-size character windows that overlap, with no
//! attempt to follow topic boundaries. Each window becomes one entry in the vector index.

use crate::config::ChunkingSettings;
use crate::error::{Result, TubechatError};
use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// A window of transcript text tagged with its owner and video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentChunk {
    /// Owner (user id) of the video.
    pub owner_id: i64,
    /// Platform video id.
    pub video_id: String,
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: i32,
}

/// Splits transcript text into overlapping windows.
pub struct TranscriptChunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TranscriptChunker {
    /// Create a chunker with the given window size and overlap, in characters.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TubechatError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| TubechatError::Config(format!("Invalid chunking settings: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a chunker from settings.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split raw text into windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunks: Vec<String> = self.splitter.chunks(text).map(str::to_string).collect();

        debug!(
            input_len = text.len(),
            chunk_count = chunks.len(),
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "Text chunked"
        );

        chunks
    }

    /// Split a transcript into chunks tagged with owner and video id.
    pub fn chunk(&self, text: &str, owner_id: i64, video_id: &str) -> Vec<ContentChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(order, content)| ContentChunk {
                owner_id,
                video_id: video_id.to_string(),
                content,
                order: order as i32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TranscriptChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("a short transcript", 7, "abc123XYZ_9");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "a short transcript");
        assert_eq!(chunks[0].owner_id, 7);
        assert_eq!(chunks[0].video_id, "abc123XYZ_9");
        assert_eq!(chunks[0].order, 0);
    }

    #[test]
    fn test_long_text_windows_respect_size() {
        let chunker = TranscriptChunker::new(1000, 200).unwrap();
        let text = sample_text(1500);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_consecutive_windows_overlap() {
        let chunker = TranscriptChunker::new(100, 40).unwrap();
        let text = sample_text(200);
        let chunks = chunker.split(&text);

        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(
                pair[0].split_whitespace().any(|w| w == first_word),
                "expected {:?} to start inside the previous window",
                pair[1]
            );
        }
    }

    #[test]
    fn test_chunk_orders_are_sequential() {
        let chunker = TranscriptChunker::new(50, 10).unwrap();
        let chunks = chunker.chunk(&sample_text(100), 1, "dQw4w9WgXcQ");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i as i32);
        }
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TranscriptChunker::new(1000, 200).unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   ").is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        assert!(TranscriptChunker::new(100, 100).is_err());
        assert!(TranscriptChunker::new(0, 0).is_err());
    }
}
