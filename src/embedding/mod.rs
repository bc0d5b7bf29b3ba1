pub mod embedder;
pub mod similarity;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding backend connection failed: {0}")]
    Connection(String),

    #[error("Embedding backend error: {0}")]
    Backend(String),

    #[error("Model initialization failed: {0}")]
    ModelInit(String),
}

/// Embedding model abstraction.
///
/// `embed` may suspend (remote backends); in-process backends return
/// immediately. Vectors are L2-normalized by every implementation.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize;
}

/// Allow `Box<dyn EmbeddingModel>` wherever `&impl EmbeddingModel` is expected.
#[async_trait]
impl EmbeddingModel for Box<dyn EmbeddingModel> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}
