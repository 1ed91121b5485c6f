// Embeddings module
// Page chunking plus the embedding provider seam and its Gemini implementation

pub mod chunking;
pub mod gemini;

pub use chunking::{ChunkingConfig, ContentChunk, chunk_pages};
pub use gemini::GeminiEmbedder;

use crate::Result;

/// Turns text into fixed-length vectors
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed document texts for storage; one vector per input, in input order
    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
