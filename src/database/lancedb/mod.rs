// LanceDB vector database module
// Row types for chunk embeddings and the table wrapper that stores them

#[cfg(test)]
mod tests;

pub mod vector_store;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::ContentChunk;

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding of `metadata.content`
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Path of the PDF the chunk was cut from
    pub source: String,
    /// 1-based page number within `source`
    pub page: u32,
    /// Index of this chunk within its page
    pub chunk_index: u32,
    /// The actual text content of the chunk
    pub content: String,
    /// Timestamp when this embedding was created (RFC 3339)
    pub created_at: String,
}

impl EmbeddingRecord {
    #[inline]
    pub fn from_chunk(chunk: &ContentChunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            metadata: ChunkMetadata {
                source: chunk.source.display().to_string(),
                page: chunk.page,
                chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
                content: chunk.content.clone(),
                created_at: Utc::now().to_rfc3339(),
            },
        }
    }
}
