//! Shared state and request/response bodies for the API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::engine::{ChatEngine, ChatEngineConfig};
use crate::chat::types::ChatTurn;
use crate::config::Config;
use crate::corpus::document::DocumentMeta;
use crate::corpus::index::CorpusIndex;
use crate::embedding::similarity::SimilarityVerdict;
use crate::embedding::EmbeddingModel;
use crate::extract::extractor::StructuredExtractor;
use crate::extract::schema::ExtractionRecord;
use crate::extract::timeline::TimelineEntry;
use crate::generation::LlmGenerate;
use crate::retrieval::live::LiveSearch;
use crate::retrieval::RetrievalResult;
use crate::scoring::types::ScoreResult;

/// Process-wide context handed to every handler.
///
/// The corpus index and embedding backend are initialized once at startup
/// and shared read-only; handlers never mutate them.
#[derive(Clone)]
pub struct AppContext {
    pub index: Arc<CorpusIndex>,
    pub embedder: Arc<dyn EmbeddingModel>,
    pub generator: Arc<dyn LlmGenerate>,
    pub live_search: Arc<dyn LiveSearch>,
    pub chat: Arc<ChatEngine>,
    pub extractor: Arc<StructuredExtractor>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(
        index: Arc<CorpusIndex>,
        embedder: Arc<dyn EmbeddingModel>,
        generator: Arc<dyn LlmGenerate>,
        live_search: Arc<dyn LiveSearch>,
        config: Config,
    ) -> Self {
        let chat = Arc::new(ChatEngine::new(
            index.clone(),
            embedder.clone(),
            generator.clone(),
            ChatEngineConfig {
                top_k: config.top_k,
                generation_timeout: config.generation_timeout,
                ..ChatEngineConfig::default()
            },
        ));
        let extractor = Arc::new(StructuredExtractor::new(generator.clone()));

        Self {
            index,
            embedder,
            generator,
            live_search,
            chat,
            extractor,
            config: Arc::new(config),
        }
    }
}

/// A submitted document body: raw text plus optional metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentBody {
    pub text: String,
    #[serde(default)]
    pub metadata: Option<DocumentMeta>,
}

/// Body of the three scoring endpoints and `/similarity`.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub document: DocumentBody,
    pub corpus_scope: String,
    /// Augment the evidence with a live external search before scoring.
    #[serde(default)]
    pub live: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Uuid,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    #[serde(flatten)]
    pub turn: ChatTurn,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub schema_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TimelineRequest {
    #[serde(flatten)]
    pub document: DocumentBody,
}

/// Timeline extraction result: an `ExtractionRecord` of the timeline
/// schema, flattened for the wire.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub schema: &'static str,
    pub document_id: Uuid,
    pub milestones: Vec<TimelineEntry>,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub document_id: Uuid,
    pub verdicts: Vec<SimilarityVerdict>,
}

#[derive(Debug, Deserialize)]
pub struct OnlineCheckBody {
    pub query: String,
    #[serde(default)]
    pub corpus_scope: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Query params for the GET variant of `/online-check`.
#[derive(Debug, Deserialize)]
pub struct OnlineCheckParams {
    pub query: String,
    pub corpus_scope: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OnlineCheckResponse {
    pub query: String,
    pub augmented: bool,
    #[serde(flatten)]
    pub result: RetrievalResult,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub corpus_scopes: Vec<String>,
    pub passages: usize,
}

/// Responses that are plain re-serializations of core types.
pub type ScoreResponse = ScoreResult;
pub type ExtractResponse = ExtractionRecord;
