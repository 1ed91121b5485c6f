// Answer generation module
// The chat-completion seam and its Gemini implementation

pub mod gemini;

pub use gemini::GeminiChatClient;

use crate::Result;

/// Produces the final answer text for an assembled prompt
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}
