pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("Generation backend connection failed: {0}")]
    Connection(String),

    #[error("Generation backend error ({status}): {body}")]
    Backend { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("No model available")]
    NoModel,

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl GenerationError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}

/// Trait for LLM text generation within the evaluation pipeline.
#[async_trait]
pub trait LlmGenerate: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}
