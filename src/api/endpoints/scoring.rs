use axum::extract::State;
use axum::Json;

use super::ingest_body;
use crate::api::error::ApiError;
use crate::api::types::{AppContext, ScoreRequest, ScoreResponse};
use crate::retrieval::live::LiveChecker;
use crate::retrieval::RetrievalResult;
use crate::scoring::{cost, novelty, plagiarism, ScoringContext};

/// Live hits offered to a scoring run.
const LIVE_MAX_RESULTS: usize = 5;

/// Characters of document text used as the live search query.
const LIVE_QUERY_CHARS: usize = 300;

/// POST /novelty
pub async fn novelty(
    State(ctx): State<AppContext>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let document = ingest_body(&req.document)?;
    let live = live_context(&ctx, &req).await;

    let scoring_ctx = scoring_context(&ctx);
    let result = novelty::evaluate(&scoring_ctx, &document, &req.corpus_scope, live.as_ref()).await?;
    Ok(Json(result))
}

/// POST /cost
pub async fn cost(
    State(ctx): State<AppContext>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let document = ingest_body(&req.document)?;
    let live = live_context(&ctx, &req).await;

    let scoring_ctx = scoring_context(&ctx);
    let result = cost::evaluate(&scoring_ctx, &document, &req.corpus_scope, live.as_ref()).await?;
    Ok(Json(result))
}

/// POST /plag
pub async fn plagiarism(
    State(ctx): State<AppContext>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let document = ingest_body(&req.document)?;
    let live = live_context(&ctx, &req).await;

    let scoring_ctx = scoring_context(&ctx);
    let result = plagiarism::evaluate(
        &scoring_ctx,
        &document,
        &req.corpus_scope,
        live.as_ref(),
        ctx.config.plagiarism_threshold,
    )
    .await?;
    Ok(Json(result))
}

fn scoring_context(ctx: &AppContext) -> ScoringContext<'_> {
    ScoringContext {
        index: &ctx.index,
        embedder: &*ctx.embedder,
        generator: &*ctx.generator,
    }
}

/// When the request opts in, gather ephemeral live context for the scoring
/// run. External search failure is recoverable: scoring proceeds without
/// augmentation.
async fn live_context(ctx: &AppContext, req: &ScoreRequest) -> Option<RetrievalResult> {
    if !req.live {
        return None;
    }

    let query: String = req.document.text.chars().take(LIVE_QUERY_CHARS).collect();
    let checker = LiveChecker::new(&*ctx.live_search, &*ctx.embedder, LIVE_MAX_RESULTS);

    match checker.augment(&query, RetrievalResult::default()).await {
        Ok(result) if !result.is_empty() => Some(result),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "live augmentation unavailable — scoring without it");
            None
        }
    }
}
