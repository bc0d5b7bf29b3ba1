pub mod cost;
pub mod novelty;
pub mod plagiarism;
pub mod types;

use thiserror::Error;

use crate::corpus::index::CorpusIndex;
use crate::corpus::passage::Passage;
use crate::embedding::EmbeddingModel;
use crate::generation::LlmGenerate;
use crate::retrieval::RetrievalResult;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Insufficient evidence: {0}")]
    InsufficientEvidence(String),

    #[error("Corpus error: {0}")]
    Corpus(#[from] crate::corpus::CorpusError),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),

    #[error("Generation failed: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    #[error("Structured response error: {0}")]
    Extract(#[from] crate::extract::ExtractError),
}

/// Shared dependencies for the three scoring modules.
pub struct ScoringContext<'a> {
    pub index: &'a CorpusIndex,
    pub embedder: &'a dyn EmbeddingModel,
    pub generator: &'a dyn LlmGenerate,
}

/// Resolve the evidence set for a scoring run: the scope's reference
/// passages plus any ephemeral live context.
///
/// Fails with `InsufficientEvidence` when both are empty — a score computed
/// against nothing would be a default in disguise.
pub(crate) fn evidence_passages(
    index: &CorpusIndex,
    corpus_scope: &str,
    live_context: Option<&RetrievalResult>,
) -> Result<Vec<Passage>, ScoringError> {
    let mut evidence: Vec<Passage> = index.scope(corpus_scope)?.to_vec();

    if let Some(live) = live_context {
        evidence.extend(live.entries.iter().map(|e| e.passage.clone()));
    }

    if evidence.is_empty() {
        return Err(ScoringError::InsufficientEvidence(format!(
            "scope `{corpus_scope}` yielded no passages and no live context was supplied"
        )));
    }

    Ok(evidence)
}
