use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{AppContext, ExtractRequest, ExtractResponse};
use crate::extract::schema::Schema;

/// POST /extract — structured extraction against a named schema.
pub async fn extract(
    State(ctx): State<AppContext>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is empty".into()));
    }

    let schema = Schema::by_name(&req.schema_name).ok_or_else(|| {
        ApiError::UnknownSchema(format!(
            "`{}` (known: {})",
            req.schema_name,
            Schema::known_names().join(", ")
        ))
    })?;

    let record = ctx.extractor.extract(&req.text, &schema).await?;
    Ok(Json(record))
}
