//! AI judgment service used by the clinical reasoners.

use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::groq::Groq;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, ChatRole, MessageType, StructuredOutputFormat,
};
use log::{debug, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use triage_rs_config::{AiConfig, AiProviderKind};
use triage_rs_protocol::ValidationError;

/// Errors returned by AI clients.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No AI client was configured for this agent.
    #[error("ai client not configured (set {0})")]
    NotConfigured(String),
    /// Building the provider failed.
    #[error("failed to build ai provider: {0}")]
    Build(String),
    /// The provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),
    /// The provider returned no text.
    #[error("empty response from model")]
    EmptyResponse,
    /// The model answered, but not with a valid decision.
    #[error("invalid model output: {0}")]
    InvalidOutput(#[source] ValidationError),
}

/// JSON schema the model should answer with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

/// One structured-output request.
#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    /// System instruction.
    pub system: String,
    /// User prompt.
    pub user: String,
    pub schema: Option<ResponseSchema>,
}

impl AiRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            schema: None,
        }
    }

    /// Ask for output matching `schema`.
    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schema = Some(ResponseSchema {
            name: name.into(),
            schema,
        });
        self
    }
}

/// Raw model answer; callers validate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub text: String,
}

/// Client for the AI judgment service.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Send one system + user exchange and return the model text.
    async fn complete(&self, request: AiRequest) -> Result<AiResponse, AiError>;
}

/// AI client over any `autoagents_llm` provider.
#[derive(Clone)]
pub struct LlmAiClient {
    llm: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmAiClient {
    /// Wrap an existing provider; `model` is only used for logging.
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Build a client for the configured provider with an explicit key.
    pub fn with_api_key(config: &AiConfig, api_key: impl Into<String>) -> Result<Self, AiError> {
        let api_key = api_key.into();
        let llm: Arc<dyn LLMProvider> = match config.provider {
            AiProviderKind::OpenAi => LLMBuilder::<OpenAI>::new()
                .api_key(api_key)
                .model(config.model.clone())
                .temperature(config.temperature)
                .max_tokens(config.max_tokens)
                .build()
                .map_err(|err| AiError::Build(err.to_string()))?,
            AiProviderKind::Groq => LLMBuilder::<Groq>::new()
                .api_key(api_key)
                .model(config.model.clone())
                .temperature(config.temperature)
                .max_tokens(config.max_tokens)
                .build()
                .map_err(|err| AiError::Build(err.to_string()))?,
        };
        debug!(
            "built ai provider (provider={}, model={}, temperature={}, max_tokens={})",
            config.provider.as_str(),
            config.model,
            config.temperature,
            config.max_tokens
        );
        Ok(Self::new(llm, config.model.clone()))
    }

    /// Build a client reading the key from the configured variable.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key_env = config.api_key_env();
        let api_key = std::env::var(api_key_env)
            .map_err(|_| AiError::NotConfigured(api_key_env.to_string()))?;
        Self::with_api_key(config, api_key)
    }
}

fn structured_output(schema: &ResponseSchema) -> Option<StructuredOutputFormat> {
    let format = json!({
        "name": schema.name,
        "description": format!("{} response", schema.name),
        "schema": schema.schema,
        "strict": true,
    });
    match serde_json::from_value(format) {
        Ok(format) => Some(format),
        Err(err) => {
            warn!(
                "structured output schema rejected; sending without (name={}, error={})",
                schema.name, err
            );
            None
        }
    }
}

fn text_message(role: ChatRole, content: String) -> ChatMessage {
    ChatMessage {
        role,
        message_type: MessageType::Text,
        content,
    }
}

#[async_trait]
impl AiClient for LlmAiClient {
    async fn complete(&self, request: AiRequest) -> Result<AiResponse, AiError> {
        let format = request.schema.as_ref().and_then(structured_output);
        let messages = vec![
            text_message(ChatRole::System, request.system),
            text_message(ChatRole::User, request.user),
        ];
        debug!(
            "sending ai request (model={}, structured={})",
            self.model,
            format.is_some()
        );
        let response = self
            .llm
            .chat_with_tools(&messages, None, format)
            .await
            .map_err(|err| AiError::Provider(err.to_string()))?;
        let text = response.text().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        debug!("ai response received (model={}, len={})", self.model, text.len());
        Ok(AiResponse { text })
    }
}
