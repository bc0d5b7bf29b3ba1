use super::types::{ScoreKind, ScoreResult};
use super::{evidence_passages, ScoringContext, ScoringError};
use crate::corpus::document::Document;
use crate::corpus::passage::passages_from_document;
use crate::embedding::similarity::SimilarityScorer;
use crate::retrieval::RetrievalResult;

/// Matches cited in the rationale.
const SUPPORTING_LIMIT: usize = 5;

const RATIONALE_SYSTEM_PROMPT: &str = "You review documents for overlap with reference material. \
Given a document and reference passages it closely matches, describe the overlapping content in a \
short paragraph. Do not output a numeric score; the score is computed separately.";

/// Plagiarism = max similarity against the evidence set, gated by a
/// threshold.
///
/// Below the threshold the score is exactly 0 with an empty supporting
/// list — a weak match is never promoted to a citation. At or above it,
/// every passage over the threshold backs the verdict.
pub async fn evaluate(
    ctx: &ScoringContext<'_>,
    document: &Document,
    corpus_scope: &str,
    live_context: Option<&RetrievalResult>,
    threshold: f32,
) -> Result<ScoreResult, ScoringError> {
    let evidence = evidence_passages(ctx.index, corpus_scope, live_context)?;
    let doc_passages = passages_from_document(document);

    let scorer = SimilarityScorer::new(ctx.embedder);
    let verdicts = scorer.score_against_corpus(&doc_passages, &evidence).await?;

    let max_similarity = verdicts.first().map(|v| v.score).unwrap_or(0.0);

    if max_similarity < threshold {
        tracing::debug!(scope = corpus_scope, max_similarity, threshold, "no plagiarism match");
        return Ok(ScoreResult::new(
            ScoreKind::Plagiarism,
            0.0,
            format!("No reference passage reached the similarity threshold of {threshold:.2}."),
            Vec::new(),
        ));
    }

    let matches: Vec<_> = verdicts
        .iter()
        .filter(|v| v.score >= threshold)
        .take(SUPPORTING_LIMIT)
        .collect();

    let supporting: Vec<String> = matches.iter().map(|v| v.reference_id.clone()).collect();

    let match_block = matches
        .iter()
        .filter_map(|v| {
            evidence
                .iter()
                .find(|p| p.id == v.reference_id)
                .map(|p| format!("[{}] (similarity {:.2})\n{}", p.id, v.score, p.text))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "DOCUMENT:\n{}\n\nMATCHED REFERENCE PASSAGES:\n{}\n\nDescribe the overlap.",
        document.full_text(),
        match_block
    );
    let elaboration = ctx.generator.generate(RATIONALE_SYSTEM_PROMPT, &prompt).await?;

    let rationale = format!(
        "Matched reference passages above threshold {:.2}: {}. {}",
        threshold,
        supporting.join(", "),
        elaboration.trim()
    );

    tracing::debug!(
        scope = corpus_scope,
        max_similarity,
        matches = supporting.len(),
        "plagiarism scored"
    );

    Ok(ScoreResult::new(
        ScoreKind::Plagiarism,
        f64::from(max_similarity),
        rationale,
        supporting,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::document::{ingest, DocumentMeta};
    use crate::corpus::index::CorpusIndex;
    use crate::corpus::passage::{Passage, PassageSource};
    use crate::embedding::embedder::DeterministicEmbedder;
    use crate::generation::{GenerationError, LlmGenerate};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Counts calls so tests can assert the below-threshold path never
    /// reaches the generator.
    #[derive(Default)]
    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmGenerate for CountingLlm {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("The matched passages repeat the document's abstract.".to_string())
        }
    }

    fn index_with(passages: Vec<Passage>) -> CorpusIndex {
        let mut index = CorpusIndex::new();
        index.insert_scope("papers", passages);
        index
    }

    #[tokio::test]
    async fn identical_text_scores_above_threshold_with_support() {
        let doc = ingest("An identical passage of text.", DocumentMeta::default()).unwrap();
        let index = index_with(vec![Passage::new(
            "papers:src:0000",
            Uuid::new_v4(),
            "An identical passage of text.",
            PassageSource::Reference,
            None,
        )]);
        let embedder = DeterministicEmbedder::new();
        let llm = CountingLlm::default();
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let result = evaluate(&ctx, &doc, "papers", None, 0.8).await.unwrap();
        assert!(result.value >= 0.8);
        assert_eq!(result.supporting, vec!["papers:src:0000"]);
        assert!(result.rationale.contains("papers:src:0000"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn below_threshold_scores_zero_without_citations_or_generation() {
        let doc = ingest("Entirely different subject matter.", DocumentMeta::default()).unwrap();
        let index = index_with(vec![Passage::new(
            "papers:other:0000",
            Uuid::new_v4(),
            "xyzzy unrelated content qqqq",
            PassageSource::Reference,
            None,
        )]);
        let embedder = DeterministicEmbedder::new();
        let llm = CountingLlm::default();
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        // Threshold of 1.0 cannot be met by distinct texts.
        let result = evaluate(&ctx, &doc, "papers", None, 0.999).await.unwrap();
        assert_eq!(result.value, 0.0);
        assert!(result.supporting.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0, "no generation below threshold");
    }

    #[tokio::test]
    async fn empty_scope_without_live_context_is_insufficient_evidence() {
        let doc = ingest("Any document.", DocumentMeta::default()).unwrap();
        let index = index_with(vec![]);
        let embedder = DeterministicEmbedder::new();
        let llm = CountingLlm::default();
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let err = evaluate(&ctx, &doc, "papers", None, 0.8).await.unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientEvidence(_)));
    }

    #[tokio::test]
    async fn score_stays_in_unit_range() {
        let doc = ingest("An identical passage of text.", DocumentMeta::default()).unwrap();
        let index = index_with(vec![Passage::new(
            "papers:src:0000",
            Uuid::new_v4(),
            "An identical passage of text.",
            PassageSource::Reference,
            None,
        )]);
        let embedder = DeterministicEmbedder::new();
        let llm = CountingLlm::default();
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let result = evaluate(&ctx, &doc, "papers", None, 0.1).await.unwrap();
        assert!(result.in_range());
    }
}
