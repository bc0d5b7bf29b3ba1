use axum::extract::{Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AppContext, OnlineCheckBody, OnlineCheckParams, OnlineCheckResponse};
use crate::retrieval::live::LiveChecker;
use crate::retrieval::retriever::Retriever;
use crate::retrieval::{RetrievalError, RetrievalResult};

/// Live hits merged per check.
const LIVE_MAX_RESULTS: usize = 5;

/// GET /online-check?query=...&corpus_scope=...&top_k=...
pub async fn check_get(
    State(ctx): State<AppContext>,
    Query(params): Query<OnlineCheckParams>,
) -> Result<Json<OnlineCheckResponse>, ApiError> {
    run_check(ctx, params.query, params.corpus_scope, params.top_k).await
}

/// POST /online-check — body variant of the same check.
pub async fn check_post(
    State(ctx): State<AppContext>,
    Json(body): Json<OnlineCheckBody>,
) -> Result<Json<OnlineCheckResponse>, ApiError> {
    run_check(ctx, body.query, body.corpus_scope, body.top_k).await
}

/// Retrieve locally (when a scope is given), then merge live results in.
///
/// Search failure is recoverable when local results exist — the check
/// degrades to the unaugmented result. With no local scope there is
/// nothing to fall back to, so the failure surfaces as 503.
async fn run_check(
    ctx: AppContext,
    query: String,
    corpus_scope: Option<String>,
    top_k: Option<usize>,
) -> Result<Json<OnlineCheckResponse>, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is empty".into()));
    }
    let top_k = top_k.unwrap_or(ctx.config.top_k);

    let local = match &corpus_scope {
        Some(scope) => {
            let query_embedding = ctx
                .embedder
                .embed(&query)
                .await
                .map_err(|e| ApiError::EmbeddingUnavailable(e.to_string()))?;
            Retriever::new(&ctx.index).retrieve(&query_embedding, scope, top_k)?
        }
        None => RetrievalResult::default(),
    };

    let had_local = !local.is_empty();
    let checker = LiveChecker::new(&*ctx.live_search, &*ctx.embedder, LIVE_MAX_RESULTS);

    match checker.augment(&query, local.clone()).await {
        Ok(result) => Ok(Json(OnlineCheckResponse {
            query,
            augmented: true,
            result,
        })),
        Err(RetrievalError::ExternalSearchUnavailable(msg)) if had_local => {
            tracing::warn!(error = %msg, "external search unavailable — returning local result");
            Ok(Json(OnlineCheckResponse {
                query,
                augmented: false,
                result: local,
            }))
        }
        Err(e) => Err(e.into()),
    }
}
