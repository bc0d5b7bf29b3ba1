use regex::Regex;

use super::types::Citation;
use crate::retrieval::RetrievalResult;

/// Excerpt length carried into a citation for display.
const EXCERPT_CHARS: usize = 200;

fn citation_pattern() -> Regex {
    Regex::new(r"\[P:\s*([A-Za-z0-9:._\-]+)\]").unwrap()
}

/// Extract citations from a generated answer, restricted to this turn's
/// retrieval result.
///
/// Markers whose id does not match a retrieved passage are discarded — the
/// citation list is derived from the retrieval set, so a fabricated id can
/// never surface. Deduplicated by passage id, ordered by relevance.
pub fn extract_citations(answer: &str, retrieval: &RetrievalResult) -> Vec<Citation> {
    let pattern = citation_pattern();
    let mut citations: Vec<Citation> = Vec::new();

    for cap in pattern.captures_iter(answer) {
        let cited_id = match cap.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };

        let entry = match retrieval.entries.iter().find(|e| e.passage.id == cited_id) {
            Some(entry) => entry,
            None => {
                tracing::warn!(passage_id = %cited_id, "citation references unretrieved passage — dropped");
                continue;
            }
        };

        if citations.iter().any(|c| c.passage_id == cited_id) {
            continue;
        }

        citations.push(Citation {
            passage_id: entry.passage.id.clone(),
            source: entry.passage.source,
            excerpt: entry.passage.text.chars().take(EXCERPT_CHARS).collect(),
            relevance: entry.relevance,
        });
    }

    citations.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.passage_id.cmp(&b.passage_id))
    });

    citations
}

/// Strip citation markers from user-visible text.
pub fn clean_citations_for_display(text: &str) -> String {
    let cleaned = citation_pattern().replace_all(text, "");
    // Collapse doubled spaces left behind by removed markers.
    let mut out = String::with_capacity(cleaned.len());
    let mut last_space = false;
    for c in cleaned.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

/// Confidence from citation coverage and context depth, in [0,1].
pub fn calculate_confidence(citations_count: usize, context_passages: usize) -> f32 {
    if context_passages == 0 {
        return 0.0;
    }

    let mut confidence: f32 = 0.3;
    confidence += (citations_count as f32 * 0.15).min(0.4);
    confidence += (context_passages as f32 * 0.05).min(0.3);
    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::passage::{Passage, PassageSource};
    use crate::retrieval::ScoredPassage;
    use uuid::Uuid;

    fn retrieval(ids_scores: &[(&str, f32)]) -> RetrievalResult {
        RetrievalResult::from_scored(
            ids_scores
                .iter()
                .map(|(id, score)| ScoredPassage {
                    passage: Passage::new(
                        *id,
                        Uuid::new_v4(),
                        format!("content of {id}"),
                        PassageSource::Reference,
                        Some(vec![1.0]),
                    ),
                    relevance: *score,
                })
                .collect(),
        )
    }

    #[test]
    fn extracts_markers_matching_retrieved_passages() {
        let retrieval = retrieval(&[("papers:a:0000", 0.9), ("papers:b:0000", 0.7)]);
        let answer = "Prior work reports 91% [P: papers:a:0000] and 88% [P: papers:b:0000].";

        let citations = extract_citations(answer, &retrieval);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].passage_id, "papers:a:0000");
        assert_eq!(citations[1].passage_id, "papers:b:0000");
    }

    #[test]
    fn fabricated_ids_are_dropped() {
        let retrieval = retrieval(&[("papers:a:0000", 0.9)]);
        let answer = "See [P: papers:a:0000] and also [P: made-up:9999].";

        let citations = extract_citations(answer, &retrieval);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].passage_id, "papers:a:0000");
    }

    #[test]
    fn duplicate_markers_deduplicate() {
        let retrieval = retrieval(&[("papers:a:0000", 0.9)]);
        let answer = "[P: papers:a:0000] again [P: papers:a:0000].";

        let citations = extract_citations(answer, &retrieval);
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn no_markers_yields_empty_list() {
        let retrieval = retrieval(&[("papers:a:0000", 0.9)]);
        let citations = extract_citations("An answer with no citations.", &retrieval);
        assert!(citations.is_empty());
    }

    #[test]
    fn clean_removes_markers_and_tidies_spacing() {
        let text = "The approach [P: papers:a:0000] is standard.";
        let clean = clean_citations_for_display(text);
        assert!(!clean.contains("[P:"));
        assert_eq!(clean, "The approach is standard.");
    }

    #[test]
    fn confidence_zero_without_context() {
        assert_eq!(calculate_confidence(3, 0), 0.0);
    }

    #[test]
    fn confidence_grows_with_citations_and_caps_at_one() {
        let low = calculate_confidence(0, 2);
        let high = calculate_confidence(3, 5);
        assert!(high > low);
        assert!(calculate_confidence(10, 20) <= 1.0);
    }
}
