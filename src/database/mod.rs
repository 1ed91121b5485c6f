// Database module
// LanceDB vector storage for page chunks and the build-or-load manager on top of it

pub mod lancedb;
pub mod manager;

pub use self::lancedb::vector_store::{SearchResult, VectorStore};
pub use self::lancedb::{ChunkMetadata, EmbeddingRecord};
pub use manager::{FixedDetector, FsDetector, StoreDetector, StoreState, VectorStoreManager};
