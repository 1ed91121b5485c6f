// Retrieval-augmented answering
// Ties the vector store, the prompt template and the answer generator together


pub mod prompt;

pub use prompt::{build_prompt, join_context};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::database::{SearchResult, VectorStoreManager};
use crate::generation::AnswerGenerator;
use crate::{Result, run_blocking};

/// Everything sent to the model for one question
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub context: String,
    pub prompt: String,
    pub sources: Vec<SearchResult>,
}

/// Generated answer together with the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: Vec<SearchResult>,
}

pub struct RagPipeline {
    manager: Mutex<VectorStoreManager>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
}

impl RagPipeline {
    #[inline]
    pub fn new(
        manager: VectorStoreManager,
        generator: Arc<dyn AnswerGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            manager: Mutex::new(manager),
            generator,
            top_k,
        }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Whether the vector store has been opened or built yet
    #[inline]
    pub async fn is_ready(&self) -> bool {
        self.manager.lock().await.is_ready()
    }

    /// Retrieve context for `question` and fill in the prompt template
    #[inline]
    pub async fn prepare(&self, question: &str) -> Result<PreparedPrompt> {
        let sources = self.manager.lock().await.query(question, self.top_k).await?;
        let context = join_context(&sources);

        debug!(
            "Prepared context from {} chunks ({} chars)",
            sources.len(),
            context.len()
        );

        Ok(PreparedPrompt {
            prompt: build_prompt(&context, question),
            context,
            sources,
        })
    }

    /// Answer `question` from the stored documents
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        info!("Answering question ({} chars)", question.len());

        let PreparedPrompt {
            prompt, sources, ..
        } = self.prepare(question).await?;

        let generator = Arc::clone(&self.generator);
        let text = run_blocking(move || generator.generate(&prompt)).await?;

        Ok(Answer {
            text,
            context: sources,
        })
    }
}
