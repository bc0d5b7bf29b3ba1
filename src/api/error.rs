//! API error envelope with HTTP status mapping.
//!
//! Taxonomy: input errors are the client's to fix (4xx, never retried
//! server-side); upstream-dependency errors are recoverable and surface as
//! 503 so callers can retry; contract errors mean an unsound result was
//! prevented — they hard-fail rather than degrade into a default.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chat::ChatError;
use crate::corpus::CorpusError;
use crate::extract::ExtractError;
use crate::generation::GenerationError;
use crate::retrieval::RetrievalError;
use crate::scoring::ScoringError;

/// Uniform error body: `{error_kind, message}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_kind: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("Generation timed out: {0}")]
    GenerationTimeout(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("External search unavailable: {0}")]
    ExternalSearchUnavailable(String),
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Extraction validation failed: {0}")]
    ExtractionValidation(String),
    #[error("Insufficient evidence: {0}")]
    InsufficientEvidence(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MalformedDocument(_) => (StatusCode::BAD_REQUEST, "malformed_document"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::UnknownSchema(_) => (StatusCode::BAD_REQUEST, "unknown_schema"),
            Self::CorpusUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "corpus_unavailable"),
            Self::EmbeddingUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable")
            }
            Self::GenerationTimeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "generation_timeout"),
            Self::GenerationFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, "generation_failed"),
            Self::ExternalSearchUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "external_search_unavailable")
            }
            Self::PolicyViolation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "policy_violation"),
            Self::ExtractionValidation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_validation")
            }
            Self::InsufficientEvidence(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_evidence")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_kind) = self.status_and_kind();

        let message = match &self {
            // Internal details stay out of the response body.
            Self::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error_kind,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CorpusError> for ApiError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::MalformedDocument(msg) => ApiError::MalformedDocument(msg),
            CorpusError::UnknownScope(scope) => ApiError::CorpusUnavailable(scope),
            CorpusError::Load(msg) => ApiError::Internal(msg),
            CorpusError::Embedding(e) => ApiError::EmbeddingUnavailable(e.to_string()),
        }
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::InvalidTopK(k) => {
                ApiError::BadRequest(format!("top_k must be positive, got {k}"))
            }
            RetrievalError::CorpusUnavailable(scope) => ApiError::CorpusUnavailable(scope),
            RetrievalError::Embedding(e) => ApiError::EmbeddingUnavailable(e.to_string()),
            RetrievalError::ExternalSearchUnavailable(msg) => {
                ApiError::ExternalSearchUnavailable(msg)
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(_) => ApiError::GenerationTimeout(err.to_string()),
            other => ApiError::GenerationFailed(other.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::PolicyViolation(msg) => ApiError::PolicyViolation(msg),
            ChatError::Generation(e) => e.into(),
            ChatError::Retrieval(e) => e.into(),
            ChatError::Embedding(e) => ApiError::EmbeddingUnavailable(e.to_string()),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnknownSchema(name) => ApiError::UnknownSchema(name),
            ExtractError::Validation(msg) => ApiError::ExtractionValidation(msg),
            ExtractError::MalformedResponse(msg) | ExtractError::JsonParsing(msg) => {
                ApiError::ExtractionValidation(msg)
            }
            ExtractError::Generation(e) => e.into(),
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InsufficientEvidence(msg) => ApiError::InsufficientEvidence(msg),
            ScoringError::Corpus(e) => e.into(),
            ScoringError::Embedding(e) => ApiError::EmbeddingUnavailable(e.to_string()),
            ScoringError::Generation(e) => e.into(),
            ScoringError::Extract(e) => e.into(),
        }
    }
}
