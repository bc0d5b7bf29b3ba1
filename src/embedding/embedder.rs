use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingModel};
use crate::generation::ollama::OllamaClient;

/// Embedding dimension of the default backend (nomic-embed-text).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Embedding model backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vec = self
            .client
            .embed(&self.model, text)
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;
        l2_normalize(&mut vec);
        Ok(vec)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX Embedder — behind `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use async_trait::async_trait;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    use super::super::{EmbeddingError, EmbeddingModel};

    /// Embedding dimension for all-MiniLM-L6-v2.
    pub const ONNX_EMBEDDING_DIM: usize = 384;

    /// In-process embedding model using ONNX Runtime (all-MiniLM-L6-v2).
    ///
    /// Requires `model.onnx` and `tokenizer.json` in the model directory.
    /// Uses interior mutability (Mutex) because `ort::Session::run` requires
    /// `&mut self` while the trait exposes `&self` for shared usage.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl OnnxEmbedder {
        /// Load the ONNX embedding model from a directory.
        pub fn load(model_dir: &Path) -> Result<Self, EmbeddingError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            for required in [&model_path, &tokenizer_path] {
                if !required.exists() {
                    return Err(EmbeddingError::ModelInit(format!(
                        "missing {}",
                        required.display()
                    )));
                }
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| {
                    EmbeddingError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EmbeddingError::ModelInit(format!("Tokenizer load failed: {e}")))?;

            tracing::info!("ONNX embedder loaded from {}", model_dir.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        /// Tokenize and run inference, returning a mean-pooled,
        /// L2-normalized embedding.
        fn infer(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let token_type_ids: Vec<i64> =
                encoding.get_type_ids().iter().map(|&t| t as i64).collect();

            let seq_len = input_ids.len();

            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
            let mask_array =
                ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone())
                    .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
            let type_array = ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| EmbeddingError::Backend("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| EmbeddingError::Backend(format!("ONNX inference failed: {e}")))?;

            let (shape, output_data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| EmbeddingError::Backend(format!("Output extraction: {e}")))?;

            if shape.len() != 3 || shape[2] as usize != ONNX_EMBEDDING_DIM {
                return Err(EmbeddingError::Backend(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {ONNX_EMBEDDING_DIM}]"
                )));
            }

            // Mean pooling with attention mask over [1, seq_len, dim].
            let mut pooled = vec![0.0f32; ONNX_EMBEDDING_DIM];
            let mut mask_sum = 0.0f32;

            for (token_idx, &mask_val_i64) in attention_mask.iter().enumerate().take(seq_len) {
                let mask_val = mask_val_i64 as f32;
                mask_sum += mask_val;
                let offset = token_idx * ONNX_EMBEDDING_DIM;
                for (dim_idx, p) in pooled.iter_mut().enumerate() {
                    *p += output_data[offset + dim_idx] * mask_val;
                }
            }

            if mask_sum > 0.0 {
                for val in &mut pooled {
                    *val /= mask_sum;
                }
            }

            super::l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    #[async_trait]
    impl EmbeddingModel for OnnxEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.infer(text)
        }

        fn dimension(&self) -> usize {
            ONNX_EMBEDDING_DIM
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::{OnnxEmbedder, ONNX_EMBEDDING_DIM};

/// Deterministic embedding model for tests and offline runs.
///
/// Produces the same unit vector for the same text on every call, which is
/// what the retrieval determinism guarantees are tested against.
pub struct DeterministicEmbedder {
    dimension: usize,
}

impl DeterministicEmbedder {
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingModel for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Generate a deterministic unit vector from text.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    let bytes = text.as_bytes();

    for (i, slot) in vec.iter_mut().enumerate() {
        let byte_idx = i % bytes.len().max(1);
        *slot = (bytes.get(byte_idx).copied().unwrap_or(0) as f32 + i as f32) / 255.0;
    }

    l2_normalize(&mut vec);
    vec
}

/// L2-normalize in place; zero vectors are left unchanged.
pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec {
            *val /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_embed_is_stable() {
        let embedder = DeterministicEmbedder::new();
        let v1 = embedder.embed("same text").await.unwrap();
        let v2 = embedder.embed("same text").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn deterministic_embed_differs_across_texts() {
        let embedder = DeterministicEmbedder::new();
        let v1 = embedder.embed("text A").await.unwrap();
        let v2 = embedder.embed("text B").await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn deterministic_embed_is_l2_normalized() {
        let embedder = DeterministicEmbedder::new();
        let vec = embedder.embed("test normalization").await.unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "Vector should be L2-normalized, got norm = {norm}"
        );
    }

    #[tokio::test]
    async fn embed_batch_matches_single_calls() {
        let embedder = DeterministicEmbedder::new();
        let batch = embedder.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("one").await.unwrap());
        assert_eq!(batch[1], embedder.embed("two").await.unwrap());
    }

    #[test]
    fn dimension_is_configurable() {
        let embedder = DeterministicEmbedder::with_dimension(16);
        assert_eq!(embedder.dimension(), 16);
    }
}
