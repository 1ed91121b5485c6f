// Build-or-load lifecycle of the persisted vector store


use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::lancedb::EmbeddingRecord;
use super::lancedb::vector_store::{SearchResult, VectorStore};
use crate::config::Config;
use crate::documents::load_documents;
use crate::embeddings::{EmbeddingProvider, chunk_pages};
use crate::{RagError, Result, run_blocking};

/// Decides whether a persisted store already exists at a path
pub trait StoreDetector: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the filesystem for the store directory
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDetector;

impl StoreDetector for FsDetector {
    #[inline]
    fn exists(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Detector with a fixed answer, for forcing the build or the load branch
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub bool);

impl StoreDetector for FixedDetector {
    #[inline]
    fn exists(&self, _path: &Path) -> bool {
        self.0
    }
}

pub enum StoreState {
    Uninitialized,
    Ready(VectorStore),
}

/// Owns the vector store and creates it on first use.
///
/// When the store directory is absent, every configured PDF is loaded,
/// chunked and embedded, and the result is written to a new store. An
/// existing directory is opened as-is without any embedding calls. A failed
/// build leaves the manager `Uninitialized`, so the next call starts over.
pub struct VectorStoreManager {
    config: Arc<Config>,
    embedder: Arc<dyn EmbeddingProvider>,
    detector: Box<dyn StoreDetector>,
    state: StoreState,
}

impl VectorStoreManager {
    #[inline]
    pub fn new(config: Arc<Config>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            detector: Box::new(FsDetector),
            state: StoreState::Uninitialized,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_detector(mut self, detector: impl StoreDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, StoreState::Ready(_))
    }

    /// Return the store, opening or building it first if needed
    #[inline]
    pub async fn get_or_build(&mut self) -> Result<&VectorStore> {
        if matches!(self.state, StoreState::Uninitialized) {
            let store = self.initialize().await?;
            self.state = StoreState::Ready(store);
        }

        match &self.state {
            StoreState::Ready(store) => Ok(store),
            StoreState::Uninitialized => Err(RagError::Database(
                "Vector store is not initialized".to_string(),
            )),
        }
    }

    /// Up to `k` stored chunks nearest to `text`, nearest first
    #[inline]
    pub async fn query(&mut self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        let embedder = Arc::clone(&self.embedder);
        let store = self.get_or_build().await?;

        let question = text.to_string();
        let vector = run_blocking(move || embedder.embed(&question)).await?;

        let results = store.search_similar(&vector, k).await?;
        debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }

    async fn initialize(&self) -> Result<VectorStore> {
        let path = self.config.vector_database_path();

        if self.detector.exists(&path) {
            info!("Loading existing vector store from {}", path.display());
            VectorStore::open(&path).await
        } else {
            info!("No vector store at {}, building from documents", path.display());
            self.build(&path).await
        }
    }

    async fn build(&self, path: &Path) -> Result<VectorStore> {
        let files = self.config.pdf_files();
        let chunking = self.config.chunking.clone();
        let chunks = run_blocking(move || {
            let pages = load_documents(&files)?;
            chunk_pages(&pages, &chunking)
        })
        .await?;

        if chunks.is_empty() {
            return Err(RagError::Pdf(
                "No text could be extracted from the configured documents".to_string(),
            ));
        }

        info!("Embedding {} chunks", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embedder = Arc::clone(&self.embedder);
        let vectors = run_blocking(move || embedder.embed_documents(&texts)).await?;

        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRecord::from_chunk(chunk, vector))
            .collect();

        match VectorStore::create(path, records).await {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!("Vector store build failed, removing {}: {}", path.display(), e);
                if let Err(cleanup) = std::fs::remove_dir_all(path) {
                    warn!("Failed to remove partial vector store: {}", cleanup);
                }
                Err(e)
            }
        }
    }
}
