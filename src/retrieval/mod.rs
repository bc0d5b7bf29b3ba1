pub mod live;
pub mod retriever;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::passage::Passage;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(usize),

    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),

    #[error("External search unavailable: {0}")]
    ExternalSearchUnavailable(String),
}

/// A passage with its relevance to the query, in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub relevance: f32,
}

/// Ranked retrieval output. Insertion order is descending relevance,
/// ties broken by ascending passage id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub entries: Vec<ScoredPassage>,
}

impl RetrievalResult {
    /// Build a result from unordered scored passages, establishing the
    /// ordering invariant.
    pub fn from_scored(mut entries: Vec<ScoredPassage>) -> Self {
        sort_entries(&mut entries);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Ids of every passage in the result, in rank order.
    pub fn passage_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.passage.id.as_str()).collect()
    }
}

pub(crate) fn sort_entries(entries: &mut [ScoredPassage]) {
    entries.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.passage.id.cmp(&b.passage.id))
    });
}
