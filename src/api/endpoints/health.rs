use axum::extract::State;
use axum::Json;

use crate::api::types::{AppContext, HealthResponse};
use crate::config::APP_VERSION;

/// GET /health — service status and loaded corpus scopes.
pub async fn check(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: APP_VERSION,
        corpus_scopes: ctx
            .index
            .scope_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        passages: ctx.index.passage_count(),
    })
}
