//! The answer orchestrator.
//!
//! [`Assistant`] ties one request/response cycle together: record the user
//! turn, retrieve supporting chunks, assemble the prompt under budget, call
//! the completion service, record the reply, and package the [`Answer`] with
//! the sources that actually made it into the prompt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use architect_model::ChatModel;
use architect_rag::{RagError, RagPipeline};

use crate::conversation::{ConversationStore, Role, Turn};
use crate::error::Result;
use crate::prompt::assemble;
use crate::prompts::SYSTEM_INSTRUCTION;

/// The user-facing text returned when generation itself fails.
///
/// Deliberately worded as an apology so callers can tell it apart from a
/// grounded answer and decide whether to retry.
pub const GENERATION_APOLOGY: &str = "I'm sorry — I couldn't generate an answer \
right now. Please try again in a moment.";

/// What to do when retrieval or generation fails mid-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep serving: answer without retrieved context, or apologize if the
    /// completion service is down. The answer carries a degraded marker.
    #[default]
    Degrade,
    /// Propagate the failure to the caller.
    Fail,
}

/// Tunables for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Turns kept per conversation (oldest evicted first).
    pub history_window: usize,
    /// Prompt content budget in characters.
    pub prompt_budget: usize,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// Failure handling policy.
    pub failure_policy: FailurePolicy,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_window: 12,
            prompt_budget: 24_000,
            temperature: 0.7,
            max_tokens: 2048,
            failure_policy: FailurePolicy::Degrade,
        }
    }
}

/// A generated answer with its citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated text, unmodified.
    pub text: String,
    /// The conversation this answer belongs to.
    pub conversation_id: String,
    /// Distinct source identifiers of the chunks that survived the prompt
    /// budget — not the full pre-truncation retrieval set.
    pub sources: Vec<String>,
    /// The model that produced the text.
    pub model: String,
    /// When the answer was produced.
    pub created_at: DateTime<Utc>,
    /// True when the answer was produced in degrade mode (retrieval or
    /// generation failed and the failure policy kept serving).
    pub degraded: bool,
}

/// Liveness report: index and provider reachability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Whether the vector index answered a count query.
    pub index_ok: bool,
    /// Chunks currently indexed (0 when the index is unreachable).
    pub chunk_count: usize,
    /// The configured embedding provider's name.
    pub provider: String,
    /// Whether the provider answered a probe embedding.
    pub provider_ok: bool,
    /// The provider's embedding dimensionality.
    pub dimensions: usize,
    /// The chat model identifier.
    pub model: String,
}

/// The RAG orchestrator: retrieval, history, prompt assembly, and generation
/// composed into one `answer` call.
///
/// # Example
///
/// ```rust,ignore
/// use architect_chat::{Assistant, AssistantConfig};
///
/// let assistant = Assistant::new(pipeline, model, AssistantConfig::default());
/// let answer = assistant.answer(None, "What is the challenge period?").await?;
/// println!("{} (sources: {:?})", answer.text, answer.sources);
/// ```
pub struct Assistant {
    pipeline: Arc<RagPipeline>,
    model: Arc<dyn ChatModel>,
    conversations: ConversationStore,
    config: AssistantConfig,
}

impl Assistant {
    /// Create a new assistant.
    pub fn new(
        pipeline: Arc<RagPipeline>,
        model: Arc<dyn ChatModel>,
        config: AssistantConfig,
    ) -> Self {
        let conversations = ConversationStore::new(config.history_window);
        Self { pipeline, model, conversations, config }
    }

    /// The conversation store. The inbound boundary may seed prior-turn
    /// history through it before the first `answer` call.
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// The underlying retrieval pipeline (ingestion runs through this).
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    /// Answer a user message within a conversation.
    ///
    /// When `conversation_id` is `None` a fresh identifier is generated and
    /// returned in the [`Answer`]. The user turn is committed to history
    /// before retrieval begins, so the transcript stays consistent with what
    /// was sent even if the rest of the request fails or is abandoned.
    ///
    /// # Errors
    ///
    /// With the default [`FailurePolicy::Degrade`], only unrecoverable
    /// conditions propagate (notably
    /// [`RagError::DimensionMismatch`]); provider and generation outages
    /// become degraded answers instead.
    pub async fn answer(&self, conversation_id: Option<&str>, message: &str) -> Result<Answer> {
        let conversation_id = conversation_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Snapshot history first: the prompt must not contain the current
        // message twice.
        let history = self.conversations.history(&conversation_id).await;
        self.conversations.append(&conversation_id, Turn::user(message)).await;

        let recent_user: Vec<String> = history
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.clone())
            .collect();

        let (results, retrieval_degraded) =
            match self.pipeline.retrieve_with_context(message, &recent_user).await {
                Ok(results) => (results, false),
                // A dimension mismatch means the index and provider disagree;
                // serving must halt until the corpus is re-ingested.
                Err(e @ RagError::DimensionMismatch { .. }) => return Err(e.into()),
                Err(e @ RagError::Config(_)) => return Err(e.into()),
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Degrade => {
                        warn!(%conversation_id, error = %e, "retrieval failed; degrading to a no-context answer");
                        (Vec::new(), true)
                    }
                    FailurePolicy::Fail => return Err(e.into()),
                },
            };

        let prompt = assemble(
            message,
            results,
            history,
            SYSTEM_INSTRUCTION,
            self.config.prompt_budget,
        );
        let sources = prompt.sources();
        let request = prompt.into_request(self.config.temperature, self.config.max_tokens);

        let completion = match self.model.complete(request).await {
            Ok(completion) => completion,
            Err(e) => match self.config.failure_policy {
                FailurePolicy::Degrade => {
                    warn!(%conversation_id, error = %e, "generation failed; returning apology");
                    self.conversations
                        .append(&conversation_id, Turn::assistant(GENERATION_APOLOGY))
                        .await;
                    return Ok(Answer {
                        text: GENERATION_APOLOGY.to_string(),
                        conversation_id,
                        sources: Vec::new(),
                        model: self.model.model().to_string(),
                        created_at: Utc::now(),
                        degraded: true,
                    });
                }
                FailurePolicy::Fail => return Err(e.into()),
            },
        };

        self.conversations.append(&conversation_id, Turn::assistant(&completion.text)).await;

        info!(
            %conversation_id,
            source_count = sources.len(),
            model = %completion.model,
            degraded = retrieval_degraded,
            "answered"
        );

        Ok(Answer {
            text: completion.text,
            conversation_id,
            sources,
            model: completion.model,
            created_at: Utc::now(),
            degraded: retrieval_degraded,
        })
    }

    /// Probe the index and the embedding provider.
    ///
    /// Never fails: unreachable collaborators are reported, not raised.
    pub async fn health(&self) -> Health {
        let (index_ok, chunk_count) = match self.pipeline.index().count().await {
            Ok(count) => (true, count),
            Err(e) => {
                warn!(error = %e, "index health probe failed");
                (false, 0)
            }
        };

        let provider = self.pipeline.provider();
        let provider_ok = provider.embed("healthcheck").await.is_ok();

        Health {
            index_ok,
            chunk_count,
            provider: provider.name().to_string(),
            provider_ok,
            dimensions: provider.dimensions(),
            model: self.model.model().to_string(),
        }
    }
}
