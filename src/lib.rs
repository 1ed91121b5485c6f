use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File tidak ditemukan: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Run blocking work (PDF parsing, HTTP calls) off the async executor
#[inline]
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RagError::Other(anyhow::anyhow!("Background task failed: {}", e)))?
}

pub mod config;
pub mod database;
pub mod documents;
pub mod embeddings;
pub mod gemini;
pub mod generation;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod rag;
pub mod web;
