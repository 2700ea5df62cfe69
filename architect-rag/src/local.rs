//! In-process embedding provider running a pretrained ONNX model.
//!
//! Loads a BERT-style sentence-embedding model (e.g. an all-MiniLM export)
//! and its `tokenizer.json` from disk, and runs inference via `tract-onnx`
//! with no network dependency. Output vectors are mean-pooled over the
//! attention mask and L2-normalized, so cosine similarity reduces to a dot
//! product. Inference is deterministic for a fixed model file.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ndarray::{Array2, Axis};
use tokenizers::Tokenizer;
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Tract plan type for an optimized, runnable ONNX graph.
type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Token-sequence truncation limit for the encoder.
const MAX_TOKENS: usize = 256;

/// An [`EmbeddingProvider`] that runs a pretrained embedding model in-process.
///
/// The model inputs follow the BERT convention: `input_ids`,
/// `attention_mask`, and `token_type_ids`, each shaped `[batch, seq]`; the
/// first output is the token-embedding tensor `[batch, seq, hidden]`.
/// Inference is CPU-bound and runs on the blocking thread pool so it does
/// not stall the async runtime.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::LocalEmbeddingProvider;
///
/// let provider = LocalEmbeddingProvider::from_files(
///     "models/all-MiniLM-L6-v2.onnx",
///     "models/tokenizer.json",
///     384,
/// )?;
/// ```
pub struct LocalEmbeddingProvider {
    plan: Arc<TractPlan>,
    tokenizer: Arc<Tokenizer>,
    dimensions: usize,
}

impl LocalEmbeddingProvider {
    /// Load the model and tokenizer from disk.
    ///
    /// `dimensions` is the model's hidden size; vectors of any other size
    /// coming out of the model are rejected rather than reshaped.
    pub fn from_files(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        dimensions: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| RagError::Config(format!("failed to load embedding model: {e}")))?
            .into_optimized()
            .map_err(|e| RagError::Config(format!("failed to optimize embedding model: {e}")))?
            .into_runnable()
            .map_err(|e| RagError::Config(format!("failed to plan embedding model: {e}")))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path.as_ref())
            .map_err(|e| RagError::Config(format!("failed to load tokenizer: {e}")))?;

        info!(model = %model_path.display(), dimensions, "loaded local embedding model");

        Ok(Self { plan: Arc::new(plan), tokenizer: Arc::new(tokenizer), dimensions })
    }

    fn unavailable(message: impl Into<String>) -> RagError {
        RagError::ProviderUnavailable { provider: "local".into(), message: message.into() }
    }
}

/// Tokenized input for one text, truncated to [`MAX_TOKENS`].
struct Encoded {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoded> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| LocalEmbeddingProvider::unavailable(format!("tokenization failed: {e}")))?;

    let take = encoding.get_ids().len().min(MAX_TOKENS);
    Ok(Encoded {
        input_ids: encoding.get_ids()[..take].iter().map(|&id| id as i64).collect(),
        attention_mask: encoding.get_attention_mask()[..take].iter().map(|&m| m as i64).collect(),
        token_type_ids: encoding.get_type_ids()[..take].iter().map(|&id| id as i64).collect(),
    })
}

/// Build a `[batch, seq]` i64 tensor from per-text rows padded with zeros.
fn input_tensor<F>(batch: &[Encoded], seq_len: usize, field: F) -> Result<Tensor>
where
    F: Fn(&Encoded) -> &[i64],
{
    let mut data = Vec::with_capacity(batch.len() * seq_len);
    for row in batch {
        let values = field(row);
        data.extend_from_slice(values);
        data.resize(data.len() + (seq_len - values.len()), 0);
    }
    Tensor::from_shape(&[batch.len(), seq_len], &data)
        .map_err(|e| LocalEmbeddingProvider::unavailable(format!("bad input shape: {e}")))
}

/// Synchronous inference over a batch: tokenize, pad, run, pool, normalize.
fn run_batch(
    plan: &TractPlan,
    tokenizer: &Tokenizer,
    dimensions: usize,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let batch: Vec<Encoded> =
        texts.iter().map(|t| encode(tokenizer, t)).collect::<Result<_>>()?;
    let seq_len = batch.iter().map(|e| e.input_ids.len()).max().unwrap_or(0).max(1);

    let inputs: TVec<TValue> = tvec![
        input_tensor(&batch, seq_len, |e| &e.input_ids)?.into(),
        input_tensor(&batch, seq_len, |e| &e.attention_mask)?.into(),
        input_tensor(&batch, seq_len, |e| &e.token_type_ids)?.into(),
    ];

    let outputs = plan
        .run(inputs)
        .map_err(|e| LocalEmbeddingProvider::unavailable(format!("inference failed: {e}")))?;

    // [batch, seq, hidden] token embeddings from the encoder.
    let hidden = outputs[0]
        .to_array_view::<f32>()
        .map_err(|e| LocalEmbeddingProvider::unavailable(format!("bad output tensor: {e}")))?
        .to_owned()
        .into_dimensionality::<ndarray::Ix3>()
        .map_err(|e| LocalEmbeddingProvider::unavailable(format!("bad output shape: {e}")))?;

    let hidden_size = hidden.shape()[2];
    if hidden_size != dimensions {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: hidden_size });
    }

    let mut mask = Array2::<i64>::zeros((batch.len(), seq_len));
    for (i, row) in batch.iter().enumerate() {
        for (j, &m) in row.attention_mask.iter().enumerate() {
            mask[[i, j]] = m;
        }
    }

    let mut embeddings = Vec::with_capacity(batch.len());
    for i in 0..batch.len() {
        let tokens = hidden.index_axis(Axis(0), i);
        let row_mask = mask.index_axis(Axis(0), i);

        // Mean pooling over unmasked tokens.
        let mut pooled = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;
        for (j, &m) in row_mask.iter().enumerate() {
            if m > 0 {
                for (k, value) in tokens.row(j).iter().enumerate() {
                    pooled[k] += value;
                }
                count += 1.0;
            }
        }
        if count > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= count);
        }

        // L2 normalization.
        let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= norm);
        }

        embeddings.push(pooled);
    }

    Ok(embeddings)
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::unavailable("inference returned no output"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "local", batch_size = texts.len(), "embedding batch");

        let plan = Arc::clone(&self.plan);
        let tokenizer = Arc::clone(&self.tokenizer);
        let dimensions = self.dimensions;
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        tokio::task::spawn_blocking(move || run_batch(&plan, &tokenizer, dimensions, &owned))
            .await
            .map_err(|e| Self::unavailable(format!("inference task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "local"
    }
}
