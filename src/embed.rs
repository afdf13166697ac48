//! Embedding provider seam.
//!
//! The pipeline talks to the embedding model through a trait so the
//! clustering stages stay independent of the concrete service. The HTTP
//! implementation targets a batch endpoint that accepts
//! `{"model": ..., "input": [...]}` and answers one vector per input, in
//! input order. Vectors are length-normalized on receipt; downstream code
//! relies on unit norm.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Api(String),
    #[error("embedding response malformed: {0}")]
    Decode(String),
    #[error("embedding count mismatch: sent {sent}, received {received}")]
    BatchMismatch { sent: usize, received: usize },
}

pub type EmbedResult<T> = Result<T, EmbedError>;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one length-normalized vector per input, in
    /// input order.
    async fn embed_batch(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>>;

    /// Model identifier the vectors were produced under.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    batch_size: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(cfg: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            batch_size: cfg.batch_size.max(1),
        }
    }

    async fn embed_chunk(&self, chunk: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        let body = serde_json::json!({ "model": self.model, "input": chunk });
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::Api(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbedError::Api(e.to_string()))?;

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::Decode(e.to_string()))?;

        if parsed.data.len() != chunk.len() {
            return Err(EmbedError::BatchMismatch {
                sent: chunk.len(),
                received: parsed.data.len(),
            });
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|row| normalize(row.embedding))
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!("Embedding chunk - size={}", chunk.len());
            out.extend(self.embed_chunk(chunk).await?);
        }
        info!(
            "Embedding completed - texts={}, model={}, duration={:.2}s",
            texts.len(),
            self.model,
            start.elapsed().as_secs_f32()
        );
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Scale a vector to unit length. Zero vectors pass through unchanged.
pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
