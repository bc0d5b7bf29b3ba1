use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AppContext, ChatRequest, ChatResponse};
use crate::chat::types::Policy;

/// POST /chat/guidelines — guideline-constrained grounded chat.
pub async fn guidelines(
    State(ctx): State<AppContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    respond(ctx, req, Policy::Guideline).await
}

/// POST /chat/specialist — specialist grounded chat.
pub async fn specialist(
    State(ctx): State<AppContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    respond(ctx, req, Policy::Specialist).await
}

async fn respond(
    ctx: AppContext,
    req: ChatRequest,
    policy: Policy,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("message text is empty".into()));
    }

    let turn = ctx.chat.respond(req.conversation_id, &req.text, policy).await?;

    Ok(Json(ChatResponse {
        conversation_id: req.conversation_id,
        turn,
    }))
}
