//! Chat completion client for Rollup Architect.
//!
//! Wraps the hosted gateway's OpenAI-compatible chat API behind the
//! [`ChatModel`] trait, with bounded timeouts and typed failures so the
//! conversational layer can apply its degrade policy instead of crashing on
//! an unreachable service.

pub mod client;
pub mod error;

pub use client::{
    ChatCompletion, ChatMessage, ChatModel, ChatModelConfig, ChatRequest, GatewayChatClient,
    MessageRole, TextStream, TokenUsage,
};
pub use error::{ModelError, Result};
