use anyhow::Result;
use async_trait::async_trait;

use crate::config::Settings;
use crate::llm::gemini::GeminiClient;
use crate::storage::ChatMessage;

/// Chat turn request payload.
pub struct ChatRequest<'a> {
    /// Earlier turns, oldest first
    pub history: &'a [ChatMessage],
    pub message: &'a str,
}

#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn reply(&self, request: ChatRequest<'_>) -> Result<String>;
}

/// Build a chat assistant from runtime settings.
pub fn build_assistant(settings: &Settings) -> Result<Box<dyn ChatAssistant>> {
    match settings.llm.provider.to_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiClient::from_settings(settings)?)),
        other => anyhow::bail!(
            "Unsupported llm.provider '{}'. Supported providers: gemini",
            other
        ),
    }
}
