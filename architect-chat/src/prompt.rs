//! Deterministic prompt assembly under a length budget.
//!
//! The template order is fixed: system instruction, conversation history in
//! chronological order, retrieved chunks labeled with their sources, then
//! the current question. When the combined content exceeds the budget, parts
//! are sacrificed in a fixed order — ascending-similarity chunks first (the
//! single best chunk is protected), then the oldest history turns, then the
//! protected chunk. The system instruction and the current question are
//! never dropped: correctness of the current turn and the grounding rules
//! outweigh history, which outweighs marginal retrieved evidence.

use architect_model::{ChatMessage, ChatRequest, MessageRole};
use architect_rag::SearchResult;

use crate::conversation::{Role, Turn};
use crate::prompts::{NO_CONTEXT_NOTE, context_block, grounded_question};

/// The survivors of budget enforcement, ready to render into a request.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// The system instruction, verbatim.
    pub system: String,
    /// Surviving history turns, chronological order.
    pub history: Vec<Turn>,
    /// Surviving retrieved chunks, descending similarity.
    pub context: Vec<SearchResult>,
    /// The current question, verbatim.
    pub query: String,
}

/// Character cost of the prompt's variable content.
///
/// Counts content lengths plus the per-chunk source labels; the fixed
/// template scaffolding is small and constant, so it is left to the
/// caller's budget margin.
fn cost(system: &str, query: &str, history: &[Turn], context: &[SearchResult]) -> usize {
    system.len()
        + query.len()
        + history.iter().map(|t| t.content.len()).sum::<usize>()
        + context.iter().map(|r| r.chunk.text.len() + r.chunk.source_id.len()).sum::<usize>()
}

/// Assemble a prompt from the retrieval results and conversation history,
/// enforcing the character budget.
///
/// `results` must be in descending similarity order, as returned by
/// retrieval. Deterministic: the same inputs always produce the same
/// survivors.
pub fn assemble(
    query: &str,
    results: Vec<SearchResult>,
    history: Vec<Turn>,
    system: &str,
    max_chars: usize,
) -> AssembledPrompt {
    let mut context = results;
    let mut history = history;

    while cost(system, query, &history, &context) > max_chars {
        if context.len() > 1 {
            // Lowest-similarity chunk goes first.
            context.pop();
        } else if !history.is_empty() {
            // Then the oldest turns.
            history.remove(0);
        } else if !context.is_empty() {
            // The best chunk goes last.
            context.pop();
        } else {
            // Only the system instruction and the question remain; those are
            // never truncated.
            break;
        }
    }

    AssembledPrompt {
        system: system.to_string(),
        history,
        context,
        query: query.to_string(),
    }
}

impl AssembledPrompt {
    /// Distinct source identifiers of the surviving chunks, in rank order.
    ///
    /// This — not the pre-truncation retrieval set — is what the answer
    /// cites: a source the model never saw is not a source.
    pub fn sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        for result in &self.context {
            if !sources.contains(&result.chunk.source_id) {
                sources.push(result.chunk.source_id.clone());
            }
        }
        sources
    }

    /// Render into a [`ChatRequest`] for the completion service.
    ///
    /// History turns become chat messages in order; the final user message
    /// carries the labeled context block (or the no-context note) and the
    /// question.
    pub fn into_request(self, temperature: f32, max_tokens: u32) -> ChatRequest {
        let mut messages: Vec<ChatMessage> = self
            .history
            .iter()
            .map(|turn| ChatMessage {
                role: match turn.role {
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                },
                content: turn.content.clone(),
            })
            .collect();

        let context = if self.context.is_empty() {
            NO_CONTEXT_NOTE.to_string()
        } else {
            context_block(&self.context)
        };

        messages.push(ChatMessage {
            role: MessageRole::User,
            content: grounded_question(&context, &self.query),
        });

        ChatRequest { system: Some(self.system), messages, temperature, max_tokens }
    }
}
