//! RAG response generation.

use super::context::format_docs;
use super::{ChatModel, ContextBuilder};
use crate::config::Prompts;
use crate::error::{Result, TubechatError};
use crate::vector_store::SearchResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// RAG engine for question answering.
pub struct RagEngine {
    context_builder: ContextBuilder,
    chat_model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(context_builder: ContextBuilder, chat_model: Arc<dyn ChatModel>) -> Self {
        Self {
            context_builder,
            chat_model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the answer prompt for a question and its context.
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.prompts.render_with_custom(&self.prompts.rag.user, &vars)
    }

    /// Answer a question about one owner's video.
    #[instrument(skip(self, question), fields(model = %self.chat_model.model_name()))]
    pub async fn answer(&self, owner_id: i64, video_id: &str, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubechatError::InvalidInput(
                "Question must not be empty".to_string(),
            ));
        }

        let sources = self.context_builder.build(owner_id, video_id, question).await?;
        if sources.is_empty() {
            warn!("No indexed chunks for video {} of user {}", video_id, owner_id);
        }

        let prompt = self.build_prompt(&format_docs(&sources), question);
        let system = self
            .prompts
            .rag
            .system
            .as_deref()
            .map(|s| self.prompts.render_with_custom(s, &HashMap::new()));

        let answer = self.chat_model.complete(system.as_deref(), &prompt).await?;
        info!(sources = sources.len(), "Answered question");

        Ok(RagResponse { answer, sources })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Chunks placed in the context.
    pub sources: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::vector_store::tests::doc;
    use crate::vector_store::{MemoryVectorStore, VectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Records the prompts it receives and echoes a canned answer.
    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<(Option<String>, String)>>,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.map(str::to_string), prompt.to_string()));
            Ok("canned answer".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    async fn engine(model: Arc<RecordingModel>) -> RagEngine {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[
                doc(1, "vid", 0, vec![1.0, 0.0]),
                doc(9, "vid", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        RagEngine::new(ContextBuilder::new(store, Arc::new(UnitEmbedder)), model)
    }

    #[tokio::test]
    async fn test_prompt_contains_only_owner_context() {
        let model = Arc::new(RecordingModel::default());
        let engine = engine(model.clone()).await;

        let response = engine.answer(1, "vid", "  what is said?  ").await.unwrap();
        assert_eq!(response.answer, "canned answer");
        assert_eq!(response.sources.len(), 1);

        let prompts = model.prompts.lock().unwrap();
        let (system, prompt) = &prompts[0];
        assert!(system.is_none());
        assert!(prompt.contains("vid chunk 0 of user 1"));
        assert!(!prompt.contains("of user 9"));
        assert!(prompt.contains("what is said?"));
        assert!(!prompt.contains("{{"));
    }

    #[tokio::test]
    async fn test_blank_question_is_invalid() {
        let model = Arc::new(RecordingModel::default());
        let engine = engine(model.clone()).await;

        let err = engine.answer(1, "vid", "   ").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_system_prompt_and_variables() {
        let model = Arc::new(RecordingModel::default());
        let mut prompts = Prompts::default();
        prompts.rag.system = Some("Answer in {{language}}.".to_string());
        prompts
            .variables
            .insert("language".to_string(), "Norwegian".to_string());

        let engine = engine(model.clone()).await.with_prompts(prompts);
        engine.answer(1, "vid", "hello?").await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts[0].0.as_deref(), Some("Answer in Norwegian."));
    }
}
