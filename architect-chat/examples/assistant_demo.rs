//! # Assistant demo
//!
//! Walks the full answer cycle — ingest documentation, ask questions,
//! follow up — with **zero API keys**: a deterministic bag-of-words embedder
//! stands in for the embedding provider and a scripted model echoes the
//! grounded prompt instead of calling the gateway.
//!
//! Run: `cargo run --example assistant_demo -p architect-chat`

use std::sync::Arc;

use async_trait::async_trait;

use architect_chat::{Assistant, AssistantConfig};
use architect_model::{ChatCompletion, ChatModel, ChatRequest, TokenUsage};
use architect_rag::{
    BoundaryChunker, Document, EmbeddingProvider, InMemoryVectorIndex, RagConfig, RagPipeline,
};

// ---------------------------------------------------------------------------
// TokenHashEmbedder — deterministic bag-of-words embeddings for demos/tests
// ---------------------------------------------------------------------------

struct TokenHashEmbedder {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for TokenHashEmbedder {
    async fn embed(&self, text: &str) -> architect_rag::Result<Vec<f32>> {
        // Each token hashes to one dimension; shared vocabulary between a
        // query and a chunk yields positive cosine similarity.
        let mut v = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let hash =
                token.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "token-hash"
    }
}

// ---------------------------------------------------------------------------
// EchoModel — prints nothing to the network, answers from the prompt itself
// ---------------------------------------------------------------------------

struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(&self, request: ChatRequest) -> architect_model::Result<ChatCompletion> {
        // A real deployment sends this to the gateway; the demo just shows
        // what the model would have been asked.
        let grounded = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let preview: String = grounded.chars().take(240).collect();
        Ok(ChatCompletion {
            text: format!("[scripted answer based on this prompt]\n{preview}…"),
            model: "echo-model".to_string(),
            usage: TokenUsage::default(),
        })
    }

    fn model(&self) -> &str {
        "echo-model"
    }
}

// ---------------------------------------------------------------------------
// Sample documentation
// ---------------------------------------------------------------------------

const CONFIG_GUIDE: &str = "\
## L2 block configuration
The L2 block time is the interval between L2 blocks (1-255 seconds, default 2).
Lower values mean faster transactions at higher cost.

## Batch configuration
The batch submission frequency controls how often transaction batches go to
L1 and must be a multiple of 12 seconds; the default is 1440 seconds. The
output root frequency must be a multiple of the L2 block time; the default
is 240 seconds.

## Challenge period
The challenge period is the window for disputing invalid state transitions.
It defaults to 12 seconds on testnet and 7 days on mainnet. Longer periods
are more secure but delay withdrawals.";

const ACCOUNTS_GUIDE: &str = "\
## Account roles
A rollup deployment uses four accounts. The admin account manages upgrades
and configuration. The proposer account submits state root proposals to L1.
The batcher account batches transactions and submits them to L1. The
sequencer account orders and executes transactions on L2. Each account needs
its own key and enough ETH for gas.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // -- 1. Build the pipeline with in-process components ------------------
    let config = RagConfig::builder()
        .chunk_size(400)
        .chunk_overlap(60)
        .top_k(3)
        .min_score(0.05)
        .build()?;
    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(TokenHashEmbedder { dimensions: 128 }))
            .index(Arc::new(InMemoryVectorIndex::new()))
            .chunker(Arc::new(BoundaryChunker::new(400, 60)))
            .build()?,
    );

    // -- 2. Ingest the documentation ---------------------------------------
    let documents = [
        Document::new("docs/configuration", CONFIG_GUIDE).with_title("Configuration parameters"),
        Document::new("docs/accounts", ACCOUNTS_GUIDE).with_title("Account roles"),
    ];
    let chunk_count = pipeline.ingest_batch(&documents).await?;
    println!("Ingested {} documents into {chunk_count} chunks.\n", documents.len());

    // -- 3. Ask questions, with a follow-up in the same conversation -------
    let assistant = Assistant::new(pipeline, Arc::new(EchoModel), AssistantConfig::default());

    let questions = ["What is the challenge period?", "Which account submits state roots?"];
    let mut conversation_id: Option<String> = None;

    for question in questions {
        println!("Q: {question}");
        let answer = assistant.answer(conversation_id.as_deref(), question).await?;
        println!("A ({}, sources: {:?}):\n{}\n", answer.model, answer.sources, answer.text);
        conversation_id = Some(answer.conversation_id);
    }

    // -- 4. Liveness probe --------------------------------------------------
    let health = assistant.health().await;
    println!(
        "health: index_ok={} chunks={} provider={} provider_ok={}",
        health.index_ok, health.chunk_count, health.provider, health.provider_ok
    );

    Ok(())
}
