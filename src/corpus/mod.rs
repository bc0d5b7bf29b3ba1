pub mod document;
pub mod index;
pub mod passage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Corpus scope not found: {0}")]
    UnknownScope(String),

    #[error("Corpus load failed: {0}")]
    Load(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),
}
