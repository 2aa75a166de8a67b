//! services/api/src/adapters/chat.rs
//!
//! A thin wrapper around the OpenAI chat completions endpoint shared by the
//! scoring, question and report adapters.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use interview_core::{PortError, PortResult};
use tracing::debug;

/// One model on one OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct ChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a system + user prompt and returns the text of the first choice.
    pub async fn complete(&self, system: &str, user: String, temperature: f32) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .temperature(temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                PortError::Unexpected(format!("Model {} returned no choices.", self.model))
            })?
            .message
            .content
            .ok_or_else(|| {
                PortError::Unexpected(format!("Model {} returned no text content.", self.model))
            })?;

        debug!("{} replied with {} characters.", self.model, content.len());
        Ok(content)
    }
}
