use axum::extract::State;
use axum::Json;

use super::ingest_body;
use crate::api::error::ApiError;
use crate::api::types::{AppContext, TimelineRequest, TimelineResponse};
use crate::corpus::passage::passages_from_document;
use crate::extract::timeline::extract_timeline;

/// POST /timeline — extract a date-ordered milestone timeline from a
/// submitted document.
pub async fn extract(
    State(ctx): State<AppContext>,
    Json(req): Json<TimelineRequest>,
) -> Result<Json<TimelineResponse>, ApiError> {
    let document = ingest_body(&req.document)?;
    let passages = passages_from_document(&document);

    let milestones = extract_timeline(&ctx.extractor, &passages).await?;

    Ok(Json(TimelineResponse {
        schema: "timeline",
        document_id: document.id,
        milestones,
    }))
}
