//! Tubechat - chat with YouTube videos
//!
//! A retrieval-augmented question answering backend over YouTube transcripts.
//!
//! # Overview
//!
//! Tubechat allows you to:
//! - Register users and ingest YouTube videos for them
//! - Index transcript chunks in a per-user, per-video vector index
//! - Ask questions about an ingested video and keep the conversation history
//! - Serve all of the above over a JSON HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `youtube` - Video URL parsing and transcript fetching
//! - `chunking` - Transcript chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction (SQLite, memory, Pinecone)
//! - `db` - Users, videos and chat messages
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Pipeline coordination
//! - `api` - HTTP routes
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::config::Settings;
//! use tubechat::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator
//!         .ingest_video("https://www.youtube.com/watch?v=dQw4w9WgXcQ", 1)
//!         .await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     let answer = orchestrator
//!         .chat(1, &result.video.video_id, "What is this video about?")
//!         .await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;
pub mod youtube;

pub use error::{Result, TubechatError};
