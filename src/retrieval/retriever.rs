use super::{sort_entries, RetrievalError, RetrievalResult, ScoredPassage};
use crate::corpus::index::CorpusIndex;
use crate::corpus::CorpusError;
use crate::embedding::similarity::clamped_cosine;

/// Nearest-neighbor retrieval over the in-memory corpus index.
///
/// Retrieval is a local, non-suspending computation; embeddings are computed
/// by the caller before entering here.
pub struct Retriever<'a> {
    index: &'a CorpusIndex,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a CorpusIndex) -> Self {
        Self { index }
    }

    /// Retrieve the `top_k` most relevant passages from `corpus_scope`.
    ///
    /// Relevance is cosine similarity clamped to [0,1]. Output is descending
    /// by relevance with ties broken by ascending passage id, so identical
    /// inputs always produce identical results.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        corpus_scope: &str,
        top_k: usize,
    ) -> Result<RetrievalResult, RetrievalError> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidTopK(top_k));
        }

        let passages = self.index.scope(corpus_scope).map_err(|e| match e {
            CorpusError::UnknownScope(name) => RetrievalError::CorpusUnavailable(name),
            other => RetrievalError::CorpusUnavailable(other.to_string()),
        })?;

        let mut entries: Vec<ScoredPassage> = passages
            .iter()
            .filter_map(|passage| {
                let embedding = match &passage.embedding {
                    Some(vec) => vec,
                    None => {
                        tracing::warn!(passage_id = %passage.id, "indexed passage missing embedding");
                        return None;
                    }
                };
                Some(ScoredPassage {
                    passage: passage.clone(),
                    relevance: clamped_cosine(query_embedding, embedding),
                })
            })
            .collect();

        sort_entries(&mut entries);
        entries.truncate(top_k);

        Ok(RetrievalResult { entries })
    }
}
