use serde::Deserialize;

use super::types::{ScoreKind, ScoreResult};
use super::{evidence_passages, ScoringContext, ScoringError};
use crate::corpus::document::Document;
use crate::corpus::passage::passages_from_document;
use crate::embedding::similarity::SimilarityScorer;
use crate::extract::parser::parse_json_block;
use crate::retrieval::RetrievalResult;

/// Comparable passages offered to the estimator.
const COMPARABLE_LIMIT: usize = 5;

const COST_SYSTEM_PROMPT: &str = r#"You estimate the cost of research projects in USD.

RULES:
1. Output exactly one fenced ```json block:
   {"estimate_usd": <number>, "rationale": <string>, "referenced_passages": [<passage-id>, ...]}
2. referenced_passages may ONLY contain ids from the COMPARABLE PASSAGES block.
3. If no comparable passage informs a figure, leave referenced_passages empty
   rather than inventing a reference."#;

#[derive(Deserialize)]
struct CostEstimate {
    estimate_usd: f64,
    rationale: String,
    #[serde(default)]
    referenced_passages: Vec<String>,
}

/// Generation-backed cost estimate in USD.
///
/// Unlike novelty and plagiarism the value itself comes from the generator,
/// so the grounding contract moves to the references: any id not present in
/// the evidence set is discarded, and an estimate left with no references is
/// explicitly marked unsupported instead of borrowing citation weight.
pub async fn evaluate(
    ctx: &ScoringContext<'_>,
    document: &Document,
    corpus_scope: &str,
    live_context: Option<&RetrievalResult>,
) -> Result<ScoreResult, ScoringError> {
    let evidence = evidence_passages(ctx.index, corpus_scope, live_context)?;
    let doc_passages = passages_from_document(document);

    // Offer the most comparable reference material as candidate grounding.
    let scorer = SimilarityScorer::new(ctx.embedder);
    let verdicts = scorer.score_against_corpus(&doc_passages, &evidence).await?;

    let comparable: Vec<_> = verdicts
        .iter()
        .take(COMPARABLE_LIMIT)
        .filter_map(|v| evidence.iter().find(|p| p.id == v.reference_id))
        .collect();

    let comparable_block = comparable
        .iter()
        .map(|p| format!("[{}]\n{}", p.id, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "DOCUMENT:\n{}\n\nCOMPARABLE PASSAGES:\n{}\n\nEstimate the project cost.",
        document.full_text(),
        comparable_block
    );

    let response = ctx.generator.generate(COST_SYSTEM_PROMPT, &prompt).await?;
    let payload = parse_json_block(&response)?;
    let estimate: CostEstimate = serde_json::from_value(payload)
        .map_err(|e| ScoringError::Extract(crate::extract::ExtractError::JsonParsing(e.to_string())))?;

    // Keep only references that exist in the evidence set.
    let supporting: Vec<String> = estimate
        .referenced_passages
        .into_iter()
        .filter(|id| {
            let known = evidence.iter().any(|p| &p.id == id);
            if !known {
                tracing::warn!(passage_id = %id, "cost estimate referenced unknown passage — dropped");
            }
            known
        })
        .collect();

    let rationale = if supporting.is_empty() {
        format!("Unsupported estimate: {}", estimate.rationale.trim())
    } else {
        format!(
            "Based on {}: {}",
            supporting.join(", "),
            estimate.rationale.trim()
        )
    };

    tracing::debug!(
        scope = corpus_scope,
        estimate_usd = estimate.estimate_usd,
        references = supporting.len(),
        "cost scored"
    );

    Ok(ScoreResult::new(
        ScoreKind::Cost,
        estimate.estimate_usd,
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
    use uuid::Uuid;

    struct MockLlm {
        response: String,
    }

    #[async_trait]
    impl LlmGenerate for MockLlm {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.response.clone())
        }
    }

    fn index_with_costs() -> CorpusIndex {
        let mut index = CorpusIndex::new();
        index.insert_scope(
            "costs",
            vec![Passage::new(
                "costs:grant-2023:0000",
                Uuid::new_v4(),
                "A comparable two-year study was funded at 180,000 USD.",
                PassageSource::Reference,
                None,
            )],
        );
        index.insert_scope("empty", vec![]);
        index
    }

    fn doc() -> Document {
        ingest("A two-year field study of retrieval systems.", DocumentMeta::default()).unwrap()
    }

    #[tokio::test]
    async fn referenced_estimate_keeps_support_and_rationale() {
        let index = index_with_costs();
        let embedder = DeterministicEmbedder::new();
        let llm = MockLlm {
            response: r#"```json
{"estimate_usd": 175000, "rationale": "Comparable to the 2023 grant.", "referenced_passages": ["costs:grant-2023:0000"]}
```"#
            .to_string(),
        };
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let result = evaluate(&ctx, &doc(), "costs", None).await.unwrap();
        assert_eq!(result.kind, ScoreKind::Cost);
        assert_eq!(result.value, 175000.0);
        assert_eq!(result.unit, "USD");
        assert_eq!(result.supporting, vec!["costs:grant-2023:0000"]);
        assert!(result.rationale.starts_with("Based on costs:grant-2023:0000"));
    }

    #[tokio::test]
    async fn fabricated_references_are_dropped_and_estimate_marked_unsupported() {
        let index = index_with_costs();
        let embedder = DeterministicEmbedder::new();
        let llm = MockLlm {
            response: r#"```json
{"estimate_usd": 500000, "rationale": "Typical for this field.", "referenced_passages": ["made-up:0000"]}
```"#
            .to_string(),
        };
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let result = evaluate(&ctx, &doc(), "costs", None).await.unwrap();
        assert!(result.supporting.is_empty());
        assert!(result.rationale.starts_with("Unsupported estimate:"));
    }

    #[tokio::test]
    async fn estimate_is_clamped_into_declared_range() {
        let index = index_with_costs();
        let embedder = DeterministicEmbedder::new();
        let llm = MockLlm {
            response: r#"```json
{"estimate_usd": -5000, "rationale": "Nonsense negative.", "referenced_passages": []}
```"#
            .to_string(),
        };
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let result = evaluate(&ctx, &doc(), "costs", None).await.unwrap();
        assert_eq!(result.value, 0.0);
        assert!(result.in_range());
    }

    #[tokio::test]
    async fn empty_scope_without_live_context_is_insufficient_evidence() {
        let index = index_with_costs();
        let embedder = DeterministicEmbedder::new();
        let llm = MockLlm {
            response: String::new(),
        };
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let err = evaluate(&ctx, &doc(), "empty", None).await.unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientEvidence(_)));
    }

    #[tokio::test]
    async fn unparsable_response_is_extract_error() {
        let index = index_with_costs();
        let embedder = DeterministicEmbedder::new();
        let llm = MockLlm {
            response: "It probably costs a lot.".to_string(),
        };
        let ctx = ScoringContext {
            index: &index,
            embedder: &embedder,
            generator: &llm,
        };

        let err = evaluate(&ctx, &doc(), "costs", None).await.unwrap_err();
        assert!(matches!(err, ScoringError::Extract(_)));
    }
}
