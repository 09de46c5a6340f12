//! Chat completion models used to write answers.

use crate::config::GenerationSettings;
use crate::error::{Result, TubechatError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A model that turns a prompt into an answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for `prompt`, optionally preceded by a system message.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;

    /// Model name for logs and diagnostics.
    fn model_name(&self) -> &str;
}

/// Chat model backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a chat model from settings.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(
                settings.api_base.as_deref(),
                Duration::from_secs(settings.timeout_seconds),
            )?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, system, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| TubechatError::Generation(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| TubechatError::Generation(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TubechatError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubechatError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TubechatError::Generation("Empty response from model".to_string()))?;

        debug!(answer_len = answer.len(), "Generated answer");
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = GenerationSettings {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            ..Default::default()
        };
        let model = OpenAIChatModel::from_settings(&settings).unwrap();
        assert_eq!(model.model_name(), "gpt-4o");
        assert!((model.temperature - 0.1).abs() < f32::EPSILON);
    }
}
