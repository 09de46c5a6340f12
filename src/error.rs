//! Error types for Tubechat.

use thiserror::Error;

/// Library-level error type for Tubechat operations.
#[derive(Error, Debug)]
pub enum TubechatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Ingest failed: {0}")]
    IngestFailure(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Video {video_id} has not been ingested by user {user_id}")]
    VideoNotFound { user_id: i64, video_id: String },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("YouTube request failed: {0}")]
    Youtube(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TubechatError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TubechatError::Config(_) => "config",
            TubechatError::InvalidUrl(_) => "invalid_url",
            TubechatError::TranscriptUnavailable { .. } => "transcript_unavailable",
            TubechatError::IngestFailure(_) => "ingest_failure",
            TubechatError::UserNotFound(_) => "user_not_found",
            TubechatError::VideoNotFound { .. } => "video_not_found",
            TubechatError::AlreadyExists(_) => "already_exists",
            TubechatError::Youtube(_) => "youtube",
            TubechatError::Embedding(_) => "embedding",
            TubechatError::VectorStore(_) => "vector_store",
            TubechatError::Generation(_) => "generation",
            TubechatError::OpenAI(_) => "openai",
            TubechatError::PasswordHash(_) => "password_hash",
            TubechatError::Io(_) => "io",
            TubechatError::Json(_) => "json",
            TubechatError::TomlParse(_) => "config",
            TubechatError::Http(_) => "http",
            TubechatError::Database(_) => "database",
            TubechatError::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TubechatError::InvalidUrl(_)
                | TubechatError::InvalidInput(_)
                | TubechatError::TranscriptUnavailable { .. }
                | TubechatError::UserNotFound(_)
                | TubechatError::VideoNotFound { .. }
                | TubechatError::AlreadyExists(_)
        )
    }
}

/// Result type alias for Tubechat operations.
pub type Result<T> = std::result::Result<T, TubechatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TubechatError::InvalidUrl("x".into()).kind(), "invalid_url");
        assert_eq!(
            TubechatError::TranscriptUnavailable {
                video_id: "abc".into(),
                reason: "disabled".into()
            }
            .kind(),
            "transcript_unavailable"
        );
        assert!(TubechatError::UserNotFound(3).is_client_error());
        assert!(!TubechatError::IngestFailure("boom".into()).is_client_error());
    }
}
