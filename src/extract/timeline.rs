use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::extractor::StructuredExtractor;
use super::schema::{Schema, MILESTONES_FIELD};
use super::ExtractError;
use crate::corpus::passage::Passage;

/// One dated milestone tied to the submission passage that states it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub milestone: String,
    pub supporting_passage: String,
}

/// Extract a project timeline from a submitted document's passages.
///
/// The document is presented passage-by-passage with ids so the model can
/// tag each milestone with its source; a milestone citing an id outside the
/// document is a validation failure. Output is sorted ascending by date,
/// ties keeping the order the model emitted (which follows textual order).
pub async fn extract_timeline(
    extractor: &StructuredExtractor,
    passages: &[Passage],
) -> Result<Vec<TimelineEntry>, ExtractError> {
    let text = passages
        .iter()
        .map(|p| format!("[{}]\n{}", p.id, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let record = extractor.extract(&text, &Schema::timeline()).await?;

    let milestones = record
        .fields
        .get(MILESTONES_FIELD)
        .and_then(|v| v.as_array())
        .ok_or_else(|| ExtractError::Validation("milestones array missing".into()))?;

    let mut entries: Vec<TimelineEntry> = milestones
        .iter()
        .map(|m| {
            serde_json::from_value(m.clone())
                .map_err(|e| ExtractError::JsonParsing(e.to_string()))
        })
        .collect::<Result<_, _>>()?;

    for entry in &entries {
        if !passages.iter().any(|p| p.id == entry.supporting_passage) {
            return Err(ExtractError::Validation(format!(
                "milestone `{}` cites unknown passage `{}`",
                entry.milestone, entry.supporting_passage
            )));
        }
    }

    // Stable: equal dates keep their emitted (textual) order.
    entries.sort_by_key(|e| e.date);

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::passage::PassageSource;
    use crate::generation::{GenerationError, LlmGenerate};
    use async_trait::async_trait;
    use std::sync::Arc;
    use uuid::Uuid;

    struct MockLlm {
        response: String,
    }

    #[async_trait]
    impl LlmGenerate for MockLlm {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.response.clone())
        }
    }

    fn doc_passages() -> Vec<Passage> {
        let doc_id = Uuid::new_v4();
        (0..3)
            .map(|i| {
                Passage::new(
                    format!("{doc_id}:{i:04}"),
                    doc_id,
                    format!("section {i}"),
                    PassageSource::Submission,
                    None,
                )
            })
            .collect()
    }

    fn extractor_with(response: &str) -> StructuredExtractor {
        StructuredExtractor::new(Arc::new(MockLlm {
            response: response.to_string(),
        }))
    }

    #[tokio::test]
    async fn milestones_sorted_ascending_by_date() {
        let passages = doc_passages();
        let p0 = &passages[0].id;
        let p1 = &passages[1].id;
        let p2 = &passages[2].id;

        // Shuffled textual order; explicit dates.
        let response = format!(
            r#"```json
{{"milestones": [
  {{"date": "2025-06-01", "milestone": "Field trial", "supporting_passage": "{p2}"}},
  {{"date": "2025-01-15", "milestone": "Ethics approval", "supporting_passage": "{p0}"}},
  {{"date": "2025-03-01", "milestone": "Pilot study", "supporting_passage": "{p1}"}}
]}}
```"#
        );

        let extractor = extractor_with(&response);
        let timeline = extract_timeline(&extractor, &passages).await.unwrap();

        let dates: Vec<String> = timeline.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-01-15", "2025-03-01", "2025-06-01"]);
    }

    #[tokio::test]
    async fn equal_dates_keep_textual_order() {
        let passages = doc_passages();
        let p0 = &passages[0].id;
        let p1 = &passages[1].id;

        let response = format!(
            r#"```json
{{"milestones": [
  {{"date": "2025-03-01", "milestone": "First mentioned", "supporting_passage": "{p0}"}},
  {{"date": "2025-03-01", "milestone": "Second mentioned", "supporting_passage": "{p1}"}}
]}}
```"#
        );

        let extractor = extractor_with(&response);
        let timeline = extract_timeline(&extractor, &passages).await.unwrap();

        assert_eq!(timeline[0].milestone, "First mentioned");
        assert_eq!(timeline[1].milestone, "Second mentioned");
    }

    #[tokio::test]
    async fn milestone_citing_unknown_passage_fails_validation() {
        let passages = doc_passages();
        let response = r#"```json
{"milestones": [
  {"date": "2025-03-01", "milestone": "Pilot", "supporting_passage": "fabricated:0000"}
]}
```"#;

        let extractor = extractor_with(response);
        let err = extract_timeline(&extractor, &passages).await.unwrap_err();
        assert!(matches!(err, ExtractError::Validation(_)));
    }

    #[tokio::test]
    async fn milestone_missing_date_fails_validation() {
        let passages = doc_passages();
        let p0 = &passages[0].id;
        let response = format!(
            r#"```json
{{"milestones": [
  {{"milestone": "Undated milestone", "supporting_passage": "{p0}"}}
]}}
```"#
        );

        let extractor = extractor_with(&response);
        let err = extract_timeline(&extractor, &passages).await.unwrap_err();
        assert!(matches!(err, ExtractError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_milestone_list_is_valid() {
        let passages = doc_passages();
        let extractor = extractor_with("```json\n{\"milestones\": []}\n```");
        let timeline = extract_timeline(&extractor, &passages).await.unwrap();
        assert!(timeline.is_empty());
    }
}
