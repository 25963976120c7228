//! LLM module for thryve
//!
//! Health chat assistant backed by the Gemini API.

mod client;
mod gemini;
mod prompts;

pub use client::{build_assistant, ChatAssistant, ChatRequest};
pub use gemini::GeminiClient;
pub use prompts::GREETING;
