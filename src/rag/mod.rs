//! RAG (Retrieval-Augmented Generation) for answering questions about a video.
//!
//! Retrieval is always scoped to one owner's video; there is no shared retriever.

pub mod context;
mod generation;
mod response;

pub use context::{format_docs, ContextBuilder};
pub use generation::{ChatModel, OpenAIChatModel};
pub use response::{RagEngine, RagResponse};
