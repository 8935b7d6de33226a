//! Text-generation seam used by the chatbot.

use async_trait::async_trait;

use crate::error::Result;

/// Opaque text producer. Any call may fail; callers decide how to recover.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
}
