use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingModel};
use crate::corpus::passage::Passage;

/// Method tag attached to every verdict this scorer produces.
pub const METHOD_COSINE: &str = "cosine";

/// Pairwise similarity between a source span and a reference passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityVerdict {
    pub source_id: String,
    pub reference_id: String,
    /// Similarity in [0,1].
    pub score: f32,
    pub method: String,
}

/// Scores similarity between passages, embedding on demand when a passage
/// carries no precomputed vector.
pub struct SimilarityScorer<'a, E: EmbeddingModel + ?Sized> {
    embedder: &'a E,
}

impl<'a, E: EmbeddingModel + ?Sized> SimilarityScorer<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self { embedder }
    }

    /// Score a single pair. Deterministic for identical embeddings.
    pub async fn score_pair(
        &self,
        a: &Passage,
        b: &Passage,
    ) -> Result<SimilarityVerdict, EmbeddingError> {
        let va = self.embedding_of(a).await?;
        let vb = self.embedding_of(b).await?;

        Ok(SimilarityVerdict {
            source_id: a.id.clone(),
            reference_id: b.id.clone(),
            score: clamped_cosine(&va, &vb),
            method: METHOD_COSINE.to_string(),
        })
    }

    /// Score a document's passages against a corpus scope.
    ///
    /// Each reference passage yields one verdict: its best match across the
    /// document, so a reference work appears once at its strongest overlap.
    /// Ordered descending by score, ties by ascending reference passage id.
    pub async fn score_against_corpus(
        &self,
        doc_passages: &[Passage],
        corpus: &[Passage],
    ) -> Result<Vec<SimilarityVerdict>, EmbeddingError> {
        let mut doc_embedded = Vec::with_capacity(doc_passages.len());
        for passage in doc_passages {
            doc_embedded.push((passage, self.embedding_of(passage).await?));
        }

        let mut verdicts = Vec::with_capacity(corpus.len());
        for reference in corpus {
            let ref_vec = self.embedding_of(reference).await?;

            let mut best: Option<(&Passage, f32)> = None;
            for (source, vec) in &doc_embedded {
                let score = clamped_cosine(vec, &ref_vec);
                let better = match best {
                    None => true,
                    Some((_, s)) => score > s,
                };
                if better {
                    best = Some((source, score));
                }
            }

            if let Some((source, score)) = best {
                verdicts.push(SimilarityVerdict {
                    source_id: source.id.clone(),
                    reference_id: reference.id.clone(),
                    score,
                    method: METHOD_COSINE.to_string(),
                });
            }
        }

        sort_verdicts(&mut verdicts);
        Ok(verdicts)
    }

    async fn embedding_of(&self, passage: &Passage) -> Result<Vec<f32>, EmbeddingError> {
        match &passage.embedding {
            Some(vec) => Ok(vec.clone()),
            None => self.embedder.embed(&passage.text).await.map_err(|e| {
                EmbeddingError::Unavailable(format!(
                    "passage {} has no embedding and on-demand embedding failed: {e}",
                    passage.id
                ))
            }),
        }
    }
}

/// Sort descending by score, ties broken by ascending reference passage id.
pub fn sort_verdicts(verdicts: &mut [SimilarityVerdict]) {
    verdicts.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.reference_id.cmp(&b.reference_id))
    });
}

/// Cosine similarity clamped to [0,1]; negative similarity carries no signal.
pub fn clamped_cosine(a: &[f32], b: &[f32]) -> f32 {
    cosine_similarity(a, b).clamp(0.0, 1.0)
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
