use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CorpusError;

/// A submitted document, immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub sections: Vec<Section>,
    pub metadata: DocumentMeta,
}

/// A contiguous, heading-delimited span of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<String>,
    pub text: String,
    /// Character offset range of `text` within the raw input.
    pub start: usize,
    pub end: usize,
}

/// Caller-supplied document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub author: Option<String>,
    pub submitted: Option<NaiveDate>,
    pub category: Option<String>,
}

impl Document {
    /// Full text of the document, sections joined in order.
    pub fn full_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Segment raw text into a `Document`.
///
/// Splits on `## `/`### ` markdown headings; text before the first heading
/// becomes an untitled section. Fails when no non-empty section remains.
pub fn ingest(raw_text: &str, metadata: DocumentMeta) -> Result<Document, CorpusError> {
    let sections = split_by_headings(raw_text);

    if sections.is_empty() {
        return Err(CorpusError::MalformedDocument(
            "no non-empty sections could be segmented".into(),
        ));
    }

    Ok(Document {
        id: Uuid::new_v4(),
        sections,
        metadata,
    })
}

fn split_by_headings(raw: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_text = String::new();
    let mut current_start = 0;
    let mut char_pos = 0;

    for line in raw.lines() {
        if line.starts_with("## ") || line.starts_with("### ") {
            push_section(
                &mut sections,
                current_heading.take(),
                &current_text,
                current_start,
                char_pos,
            );
            current_heading = Some(line.trim_start_matches('#').trim().to_string());
            current_text = String::new();
            current_start = char_pos;
        } else {
            current_text.push_str(line);
            current_text.push('\n');
        }
        char_pos += line.len() + 1;
    }

    push_section(
        &mut sections,
        current_heading,
        &current_text,
        current_start,
        char_pos,
    );

    sections
}

fn push_section(
    sections: &mut Vec<Section>,
    heading: Option<String>,
    text: &str,
    start: usize,
    end: usize,
) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        sections.push(Section {
            heading,
            text: trimmed.to_string(),
            start,
            end,
        });
    }
}
