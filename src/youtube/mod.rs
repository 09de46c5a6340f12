//! YouTube integration: video URL parsing and caption retrieval.

mod captions;
mod video_url;

pub use captions::{parse_timed_text, YoutubeTranscriptFetcher};
pub use video_url::{extract_video_id, is_video_id};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A complete transcript with timed segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Language code of the caption track, e.g. "en".
    pub language_code: String,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    /// Caption segments in playback order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(
        video_id: String,
        language_code: String,
        is_generated: bool,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        Self {
            video_id,
            language_code,
            is_generated,
            segments,
        }
    }

    /// All segment texts joined by single spaces, timing discarded.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// End of the last segment in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.start_seconds + s.duration_seconds)
            .unwrap_or(0.0)
    }
}

/// A single caption segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// How long the caption is shown, in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// Source of video transcripts.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript for a platform video id.
    ///
    /// Fails with `TranscriptUnavailable` when captions are disabled or no
    /// track exists in an accepted language.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}
