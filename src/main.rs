use std::sync::Arc;

use legal_rag::config::Config;
use legal_rag::database::VectorStoreManager;
use legal_rag::embeddings::GeminiEmbedder;
use legal_rag::generation::GeminiChatClient;
use legal_rag::rag::RagPipeline;
use legal_rag::{RagError, Result, web};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env().map_err(|e| RagError::Config(format!("{:#}", e)))?;
    let config = Arc::new(config);

    let embedder = Arc::new(GeminiEmbedder::new(&config)?);
    let generator = Arc::new(GeminiChatClient::new(&config)?);

    let manager = VectorStoreManager::new(Arc::clone(&config), embedder);
    let pipeline = Arc::new(RagPipeline::new(
        manager,
        generator,
        config.retrieval.top_k,
    ));

    println!(
        "Open http://{}:{} in your browser",
        config.server.host, config.server.port
    );
    web::serve(config, pipeline).await
}
