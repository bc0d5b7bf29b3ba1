use super::types::{ScoreKind, ScoreResult};
use super::{evidence_passages, ScoringContext, ScoringError};
use crate::corpus::document::Document;
use crate::corpus::passage::passages_from_document;
use crate::embedding::similarity::SimilarityScorer;
use crate::retrieval::RetrievalResult;

/// Verdicts cited in the rationale.
const SUPPORTING_LIMIT: usize = 3;

const RATIONALE_SYSTEM_PROMPT: &str = "You assess the novelty of research documents. \
Given a document and its closest reference passages, explain in a short paragraph what overlaps \
and what, if anything, is new. Do not output a numeric score; the score is computed separately.";

/// Novelty = 1 − max similarity against the evidence set.
///
/// The score is similarity-derived; generation only elaborates the
/// rationale. The most similar passages always lead the rationale so the
/// supporting list is honest by construction.
pub async fn evaluate(
    ctx: &ScoringContext<'_>,
    document: &Document,
    corpus_scope: &str,
    live_context: Option<&RetrievalResult>,
) -> Result<ScoreResult, ScoringError> {
    let evidence = evidence_passages(ctx.index, corpus_scope, live_context)?;
    let doc_passages = passages_from_document(document);

    let scorer = SimilarityScorer::new(ctx.embedder);
    let verdicts = scorer.score_against_corpus(&doc_passages, &evidence).await?;

    let max_similarity = verdicts.first().map(|v| f64::from(v.score)).unwrap_or(0.0);
    let score = 1.0 - max_similarity;

    let supporting: Vec<String> = verdicts
        .iter()
        .take(SUPPORTING_LIMIT)
        .map(|v| v.reference_id.clone())
        .collect();

    let overlap_block = verdicts
        .iter()
        .take(SUPPORTING_LIMIT)
        .filter_map(|v| {
            evidence
                .iter()
                .find(|p| p.id == v.reference_id)
                .map(|p| format!("[{}] (similarity {:.2})\n{}", p.id, v.score, p.text))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "DOCUMENT:\n{}\n\nCLOSEST REFERENCE PASSAGES:\n{}\n\nExplain the overlap.",
        document.full_text(),
        overlap_block
    );
    let elaboration = ctx.generator.generate(RATIONALE_SYSTEM_PROMPT, &prompt).await?;

    let rationale = format!(
        "Most similar reference passages: {}. {}",
        supporting.join(", "),
        elaboration.trim()
    );

    tracing::debug!(scope = corpus_scope, max_similarity, score, "novelty scored");

    Ok(ScoreResult::new(ScoreKind::Novelty, score, rationale, supporting))
}
