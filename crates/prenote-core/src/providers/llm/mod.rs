//! Model client boundary.
//!
//! The pipeline treats text generation as an opaque, injectable capability:
//! a prompt and a token limit go in, raw text or a tagged failure comes out.
//! No retry logic lives here; all retry policy belongs to the repair loop.

pub mod openai;
pub mod stub;

pub use openai::OpenAiClient;
pub use stub::StubClient;

use async_trait::async_trait;

use crate::errors::ModelError;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate raw text for `prompt`, bounded by `max_tokens`.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError>;

    fn provider_name(&self) -> &'static str;
}
