use axum::extract::State;
use axum::Json;

use super::ingest_body;
use crate::api::error::ApiError;
use crate::api::types::{AppContext, ScoreRequest, SimilarityResponse};
use crate::corpus::passage::passages_from_document;
use crate::embedding::similarity::SimilarityScorer;

/// POST /similarity — score a document against a corpus scope, returning
/// every verdict in descending similarity order.
pub async fn check(
    State(ctx): State<AppContext>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<SimilarityResponse>, ApiError> {
    let document = ingest_body(&req.document)?;
    let doc_passages = passages_from_document(&document);

    let corpus = ctx.index.scope(&req.corpus_scope)?;

    let scorer = SimilarityScorer::new(&*ctx.embedder);
    let verdicts = scorer
        .score_against_corpus(&doc_passages, corpus)
        .await
        .map_err(|e| ApiError::EmbeddingUnavailable(e.to_string()))?;

    Ok(Json(SimilarityResponse {
        document_id: document.id,
        verdicts,
    }))
}
