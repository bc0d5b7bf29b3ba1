use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Document;

/// Where a passage came from, surfaced in rationales and citations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassageSource {
    /// Indexed reference corpus.
    Reference,
    /// Sectioned from a submitted document.
    Submission,
    /// Ephemeral result of an external search; never persisted.
    Live,
}

/// Minimal retrievable unit of text with a precomputed embedding.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Stable identifier, unique within its corpus.
    pub id: String,
    pub document_id: Uuid,
    pub text: String,
    pub source: PassageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Passage {
    pub fn new(
        id: impl Into<String>,
        document_id: Uuid,
        text: impl Into<String>,
        source: PassageSource,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        Self {
            id: id.into(),
            document_id,
            text: text.into(),
            source,
            embedding,
        }
    }
}

/// View a whole document as a single passage, for pairwise scoring
/// against another passage or document.
pub fn document_as_passage(doc: &Document) -> Passage {
    Passage::new(
        doc.id.to_string(),
        doc.id,
        doc.full_text(),
        PassageSource::Submission,
        None,
    )
}

/// Turn a submitted document's sections into submission passages.
///
/// Ids are `{doc_id}:{index}` so ties in retrieval break deterministically
/// in section order.
pub fn passages_from_document(doc: &Document) -> Vec<Passage> {
    doc.sections
        .iter()
        .enumerate()
        .map(|(idx, section)| {
            Passage::new(
                format!("{}:{idx:04}", doc.id),
                doc.id,
                section.text.clone(),
                PassageSource::Submission,
                None,
            )
        })
        .collect()
}
