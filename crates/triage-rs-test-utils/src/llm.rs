//! `autoagents_llm` providers with scripted answers.
//!
//! Only chat is scripted; completion and embedding calls fail, since nothing
//! in the triage path uses them.

use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{LLMProvider, ToolCall};
use parking_lot::Mutex;
use std::sync::Arc;

/// Chat response carrying plain text and no tool calls.
#[derive(Debug, Clone)]
pub struct FixedChatResponse {
    text: String,
}

impl FixedChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for FixedChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl ChatResponse for FixedChatResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Implements the non-chat provider traits as failures.
macro_rules! unsupported_non_chat {
    ($ty:ty) => {
        #[async_trait]
        impl CompletionProvider for $ty {
            async fn complete(
                &self,
                _req: &CompletionRequest,
                _json_schema: Option<StructuredOutputFormat>,
            ) -> Result<CompletionResponse, LLMError> {
                Err(LLMError::ProviderError(
                    "completion not scripted".to_string(),
                ))
            }
        }

        #[async_trait]
        impl EmbeddingProvider for $ty {
            async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
                Err(LLMError::ProviderError("embedding not scripted".to_string()))
            }
        }

        #[async_trait]
        impl ModelsProvider for $ty {}

        impl LLMProvider for $ty {}
    };
}

/// Answers every chat with the same text.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    response: String,
}

impl FixedLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FixedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

unsupported_non_chat!(FixedLLM);

/// Like [`FixedLLM`], but keeps the messages and schema of the last chat.
#[derive(Debug, Clone)]
pub struct RecordingChatLLM {
    response: String,
    pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    pub last_schema: Arc<Mutex<Option<StructuredOutputFormat>>>,
}

impl RecordingChatLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            last_messages: Arc::new(Mutex::new(Vec::new())),
            last_schema: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl ChatProvider for RecordingChatLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        *self.last_messages.lock() = messages.to_vec();
        *self.last_schema.lock() = json_schema;
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

unsupported_non_chat!(RecordingChatLLM);

/// Fails every chat with a provider error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

unsupported_non_chat!(FailingLLM);
