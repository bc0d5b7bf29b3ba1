pub mod chat;
pub mod extraction;
pub mod health;
pub mod online;
pub mod scoring;
pub mod similarity;
pub mod timeline;

use crate::api::error::ApiError;
use crate::api::types::DocumentBody;
use crate::corpus::document::{ingest, Document};

/// Ingest a request body into a `Document`, mapping segmentation failures
/// to the client-error envelope.
pub(crate) fn ingest_body(body: &DocumentBody) -> Result<Document, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::MalformedDocument("document text is empty".into()));
    }
    ingest(&body.text, body.metadata.clone().unwrap_or_default()).map_err(Into::into)
}
