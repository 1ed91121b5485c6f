
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use crate::config::Config;
use crate::gemini::{Content, GeminiClient, model_path};
use crate::{RagError, Result};

const TASK_RETRIEVAL_QUERY: &str = "RETRIEVAL_QUERY";
const TASK_RETRIEVAL_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";

/// Embedding provider backed by the Gemini `embedContent` API
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
    batch_size: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let client = GeminiClient::new(config)
            .map_err(|e| RagError::Config(format!("Failed to initialize Gemini client: {:#}", e)))?;

        Ok(Self {
            client,
            model: config.gemini.embedding_model.clone(),
            batch_size: config.gemini.batch_size,
        })
    }

    fn request(&self, text: &str, task_type: &'static str) -> EmbedRequest {
        EmbedRequest {
            model: model_path(&self.model),
            content: Content::text(text),
            task_type,
        }
    }

    fn embed_single_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.request(text, TASK_RETRIEVAL_DOCUMENT))
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .client
            .post(&self.model, "batchEmbedContents", &request)
            .with_context(|| format!("Failed to embed batch of {} texts", texts.len()))?;

        if response.embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            ));
        }

        Ok(response
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

impl EmbeddingProvider for GeminiEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating query embedding (length: {})", text.len());

        let request = self.request(text, TASK_RETRIEVAL_QUERY);
        let response: EmbedResponse = self
            .client
            .post(&self.model, "embedContent", &request)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        debug!(
            "Generated embedding with {} dimensions",
            response.embedding.values.len()
        );
        Ok(response.embedding.values)
    }

    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1) as usize) {
            let batch_vectors = self
                .embed_single_batch(batch)
                .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;
            vectors.extend(batch_vectors);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(vectors)
    }
}
