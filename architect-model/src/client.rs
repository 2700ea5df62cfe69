//! Chat completion client for the hosted gateway.
//!
//! The gateway fronts the actual chat models behind an OpenAI-compatible
//! `/v1/chat/completions` endpoint, so [`GatewayChatClient`] drives it with
//! [`async_openai`] pointed at the gateway base URL. The service is treated
//! as untrusted-for-latency: every call runs under a bounded timeout, and
//! failures come back as typed
//! [`GenerationUnavailable`](crate::ModelError::GenerationUnavailable)
//! conditions instead of unstructured errors.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};

/// Default request timeout for completion calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A stream of generated text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Who said a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human asking questions.
    User,
    /// The model's earlier replies.
    Assistant,
}

/// One turn of the conversation as sent to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The speaker.
    pub role: MessageRole,
    /// The message text.
    pub content: String,
}

/// An assembled prompt ready for the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System instruction, sent first when present.
    pub system: Option<String>,
    /// Conversation messages in chronological order; the final message
    /// carries the grounded question.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
}

/// Token accounting reported by the completion service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the generated completion.
    pub completion_tokens: u32,
    /// Total billed tokens.
    pub total_tokens: u32,
}

/// A completed generation: text plus the model that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// The generated text, passed through unmodified.
    pub text: String,
    /// The model identifier the service reports having used.
    pub model: String,
    /// Usage metadata, when the service reports it.
    pub usage: TokenUsage,
}

/// A service that turns an assembled prompt into generated text.
///
/// The orchestrator depends on this trait so tests can substitute a
/// scripted model; [`GatewayChatClient`] is the production implementation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the prompt and return the completed generation.
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion>;

    /// The model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Configuration for [`GatewayChatClient`].
#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    /// Gateway root URL (the client appends `/v1/...`).
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Chat model identifier.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ChatModelConfig {
    /// Create a config with the default timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A [`ChatModel`] speaking the gateway's OpenAI-compatible chat API.
///
/// # Example
///
/// ```rust,ignore
/// use architect_model::{ChatModelConfig, GatewayChatClient};
///
/// let client = GatewayChatClient::new(ChatModelConfig::new(
///     "https://gateway.example.net/v1",
///     "key",
///     "claude-sonnet-4-5",
/// ))?;
/// let completion = client.complete(request).await?;
/// ```
#[derive(Debug)]
pub struct GatewayChatClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl GatewayChatClient {
    /// Create a new client for the configured gateway.
    pub fn new(config: ChatModelConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ModelError::Config("gateway base URL must not be empty".into()));
        }
        if config.model.is_empty() {
            return Err(ModelError::Config("chat model must not be empty".into()));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model,
            timeout: config.timeout,
        })
    }

    fn unavailable(message: impl Into<String>) -> ModelError {
        ModelError::GenerationUnavailable { message: message.into() }
    }

    fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<async_openai::types::CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()
                    .map_err(|e| ModelError::Config(format!("bad system message: {e}")))?
                    .into(),
            );
        }

        for message in &request.messages {
            let converted = match message.role {
                MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| ModelError::Config(format!("bad user message: {e}")))?
                    .into(),
                MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| ModelError::Config(format!("bad assistant message: {e}")))?
                    .into(),
            };
            messages.push(converted);
        }

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build request: {e}")))
    }

    /// Stream the completion as text deltas.
    ///
    /// Yields chunks of the response as they arrive. The non-streaming
    /// [`complete`](ChatModel::complete) is what the orchestrator uses; this
    /// exists for callers that relay tokens to an interactive client.
    pub async fn complete_stream(&self, request: ChatRequest) -> Result<TextStream> {
        let openai_request = self.build_request(&request)?;
        let model = self.model.clone();

        let mut stream = tokio::time::timeout(
            self.timeout,
            self.client.chat().create_stream(openai_request),
        )
        .await
        .map_err(|_| Self::unavailable(format!("stream start timed out for model {model}")))?
        .map_err(|e| {
            error!(model = %model, error = %e, "failed to start completion stream");
            Self::unavailable(format!("stream failed: {e}"))
        })?;

        Ok(Box::pin(try_stream! {
            while let Some(result) = stream.next().await {
                let chunk = result.map_err(|e| {
                    error!(error = %e, "completion stream error");
                    Self::unavailable(format!("stream error: {e}"))
                })?;
                if let Some(delta) =
                    chunk.choices.first().and_then(|c| c.delta.content.as_deref())
                {
                    yield delta.to_string();
                }
            }
        }))
    }
}

#[async_trait]
impl ChatModel for GatewayChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        let openai_request = self.build_request(&request)?;

        debug!(
            model = %self.model,
            message_count = request.messages.len(),
            "sending completion request"
        );

        let response =
            tokio::time::timeout(self.timeout, self.client.chat().create(openai_request))
                .await
                .map_err(|_| {
                    error!(model = %self.model, timeout = ?self.timeout, "completion timed out");
                    Self::unavailable(format!("request timed out after {:?}", self.timeout))
                })?
                .map_err(|e| {
                    error!(model = %self.model, error = %e, "completion request failed");
                    Self::unavailable(format!("request failed: {e}"))
                })?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                ModelError::InvalidResponse("response contained no message content".into())
            })?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion received"
        );

        Ok(ChatCompletion { text, model: response.model, usage })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
