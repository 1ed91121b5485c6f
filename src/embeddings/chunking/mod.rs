
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

use crate::config::ConfigError;
use crate::documents::DocumentPage;
use crate::{RagError, Result};

/// Represents a chunk of page text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The chunk text
    pub content: String,
    /// File the chunk was cut from
    pub source: PathBuf,
    /// 1-based page number within `source`
    pub page: u32,
    /// The index of this chunk within its page
    pub chunk_index: usize,
}

/// Configuration for page chunking, measured in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of the same page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(100..=8000).contains(&self.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunk_overlap,
                self.chunk_size,
            ));
        }

        Ok(())
    }
}

/// Split every page into overlapping chunks.
///
/// Pages are split independently so no chunk spans two pages, and the output
/// keeps page order. Splits land on the coarsest boundary that fits
/// (paragraph, line, sentence, word) before falling back to characters.
#[inline]
pub fn chunk_pages(pages: &[DocumentPage], config: &ChunkingConfig) -> Result<Vec<ContentChunk>> {
    if config.chunk_size == 0 {
        return Err(RagError::Chunking("Chunk size must be positive".to_string()));
    }

    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| RagError::Chunking(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(chunk_config);
    let mut chunks = Vec::new();

    for page in pages {
        let page_chunks = splitter
            .chunks(&page.text)
            .filter(|chunk| !chunk.trim().is_empty())
            .enumerate()
            .map(|(chunk_index, chunk)| ContentChunk {
                content: chunk.to_string(),
                source: page.source.clone(),
                page: page.page,
                chunk_index,
            });
        chunks.extend(page_chunks);
    }

    debug!(
        "Chunked {} pages into {} chunks (avg {} chars)",
        pages.len(),
        chunks.len(),
        chunks
            .iter()
            .map(|c| c.content.chars().count())
            .sum::<usize>()
            / chunks.len().max(1)
    );

    Ok(chunks)
}
