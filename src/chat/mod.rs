pub mod citation;
pub mod engine;
pub mod prompt;
pub mod store;
pub mod types;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] crate::retrieval::RetrievalError),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),

    #[error("Generation failed: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),
}

impl ChatError {
    /// Whether the caller may retry the turn with identical inputs.
    /// Policy violations are final for the turn.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_retryable(),
            Self::Retrieval(_) | Self::Embedding(_) => true,
            Self::PolicyViolation(_) => false,
        }
    }
}
