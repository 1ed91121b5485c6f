#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AnswerGenerator;
use crate::config::Config;
use crate::gemini::{Content, GeminiClient};
use crate::{RagError, Result};

/// Chat completion through the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiChatClient {
    client: GeminiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiChatClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let client = GeminiClient::new(config)
            .map_err(|e| RagError::Config(format!("Failed to initialize Gemini client: {:#}", e)))?;

        Ok(Self {
            client,
            model: config.gemini.chat_model.clone(),
        })
    }
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(RagError::Generation(format!(
                "Prompt was blocked: {}",
                reason
            )));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Generation("Model returned no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(RagError::Generation(format!(
                "Model returned an empty answer (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

impl AnswerGenerator for GeminiChatClient {
    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Sending prompt to {} ({} chars)", self.model, prompt.len());

        let request = GenerateRequest {
            contents: vec![Content::user(prompt)],
        };

        let response: GenerateResponse = self
            .client
            .post(&self.model, "generateContent", &request)
            .map_err(|e| RagError::Generation(format!("{:#}", e)))?;

        let text = response.into_text()?;
        info!("Received answer from {} ({} chars)", self.model, text.len());
        Ok(text)
    }
}
