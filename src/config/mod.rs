//! Configuration module for Tubechat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, DatabaseSettings, EmbeddingSettings, GeneralSettings, GenerationSettings,
    PromptSettings, RagSettings, SearchType, ServerSettings, Settings, VectorStoreProvider,
    VectorStoreSettings, YoutubeSettings,
};
