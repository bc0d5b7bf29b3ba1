//! Live augmentation: when local corpus coverage is thin, an external
//! search contributes ephemeral passages tagged `source=live`. Results are
//! never persisted to the reference corpus.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::{sort_entries, RetrievalError, RetrievalResult, ScoredPassage};
use crate::corpus::passage::{Passage, PassageSource};
use crate::embedding::similarity::clamped_cosine;
use crate::embedding::EmbeddingModel;

/// One hit from an external search backend.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// External search abstraction.
#[async_trait]
pub trait LiveSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<LiveResult>, RetrievalError>;
}

/// Search client for a SearxNG-style JSON endpoint (`?q=...&format=json`).
pub struct HttpSearchClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<LiveResult>,
}

impl HttpSearchClient {
    pub fn new(endpoint: &str) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| RetrievalError::ExternalSearchUnavailable(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl LiveSearch for HttpSearchClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<LiveResult>, RetrievalError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| RetrievalError::ExternalSearchUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::ExternalSearchUnavailable(format!(
                "search endpoint returned {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ExternalSearchUnavailable(e.to_string()))?;

        Ok(parsed.results.into_iter().take(max_results).collect())
    }
}

/// Merges live search results into a local retrieval result.
pub struct LiveChecker<'a, S: LiveSearch + ?Sized, E: EmbeddingModel + ?Sized> {
    search: &'a S,
    embedder: &'a E,
    max_results: usize,
}

impl<'a, S: LiveSearch + ?Sized, E: EmbeddingModel + ?Sized> LiveChecker<'a, S, E> {
    pub fn new(search: &'a S, embedder: &'a E, max_results: usize) -> Self {
        Self {
            search,
            embedder,
            max_results,
        }
    }

    /// Issue an external search for `query` and merge the hits into
    /// `local_result`, preserving the descending-relevance ordering.
    ///
    /// Injected passages are tagged `source=live` so downstream rationales
    /// can disclose their provenance. On `ExternalSearchUnavailable` the
    /// caller proceeds with the unaugmented local result.
    pub async fn augment(
        &self,
        query: &str,
        local_result: RetrievalResult,
    ) -> Result<RetrievalResult, RetrievalError> {
        let hits = self.search.search(query, self.max_results).await?;
        if hits.is_empty() {
            return Ok(local_result);
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut entries = local_result.entries;
        for (idx, hit) in hits.iter().enumerate() {
            let text = if hit.snippet.is_empty() {
                hit.title.clone()
            } else {
                format!("{}\n{}", hit.title, hit.snippet)
            };

            let embedding = self.embedder.embed(&text).await?;
            let relevance = clamped_cosine(&query_embedding, &embedding);

            // Ephemeral passage: identity derived from the result URL, never
            // inserted into the corpus index.
            let document_id = Uuid::new_v5(&Uuid::NAMESPACE_URL, hit.url.as_bytes());
            entries.push(ScoredPassage {
                passage: Passage::new(
                    format!("live:{idx:04}:{document_id}"),
                    document_id,
                    text,
                    PassageSource::Live,
                    Some(embedding),
                ),
                relevance,
            });
        }

        sort_entries(&mut entries);
        tracing::debug!(injected = hits.len(), total = entries.len(), "live augmentation merged");

        Ok(RetrievalResult { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::embedder::DeterministicEmbedder;

    struct FixedSearch {
        results: Vec<LiveResult>,
    }

    #[async_trait]
    impl LiveSearch for FixedSearch {
        async fn search(
            &self,
            _query: &str,
            max_results: usize,
        ) -> Result<Vec<LiveResult>, RetrievalError> {
            Ok(self.results.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl LiveSearch for FailingSearch {
        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<LiveResult>, RetrievalError> {
            Err(RetrievalError::ExternalSearchUnavailable("offline".into()))
        }
    }

    fn local_result() -> RetrievalResult {
        let passage = Passage::new(
            "papers:a:0000",
            Uuid::new_v4(),
            "local passage",
            PassageSource::Reference,
            Some(vec![1.0, 0.0]),
        );
        RetrievalResult::from_scored(vec![ScoredPassage {
            passage,
            relevance: 0.9,
        }])
    }

    #[tokio::test]
    async fn augment_merges_and_tags_live_passages() {
        let search = FixedSearch {
            results: vec![
                LiveResult {
                    title: "Result one".into(),
                    url: "https://example.org/one".into(),
                    snippet: "snippet one".into(),
                },
                LiveResult {
                    title: "Result two".into(),
                    url: "https://example.org/two".into(),
                    snippet: "snippet two".into(),
                },
            ],
        };
        let embedder = DeterministicEmbedder::new();
        let checker = LiveChecker::new(&search, &embedder, 5);

        let merged = checker.augment("query text", local_result()).await.unwrap();

        assert_eq!(merged.len(), 3);
        let live_count = merged
            .entries
            .iter()
            .filter(|e| e.passage.source == PassageSource::Live)
            .count();
        assert_eq!(live_count, 2);

        // Ordering invariant holds after merge.
        for pair in merged.entries.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance);
        }
    }

    #[tokio::test]
    async fn augment_failure_is_recoverable() {
        let embedder = DeterministicEmbedder::new();
        let checker = LiveChecker::new(&FailingSearch, &embedder, 5);

        let err = checker
            .augment("query", local_result())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::ExternalSearchUnavailable(_)));
    }

    #[tokio::test]
    async fn augment_with_no_hits_returns_local_unchanged() {
        let search = FixedSearch { results: vec![] };
        let embedder = DeterministicEmbedder::new();
        let checker = LiveChecker::new(&search, &embedder, 5);

        let local = local_result();
        let expected_ids: Vec<String> =
            local.passage_ids().iter().map(|s| s.to_string()).collect();

        let merged = checker.augment("query", local).await.unwrap();
        assert_eq!(
            merged.passage_ids(),
            expected_ids.iter().map(String::as_str).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn augment_respects_max_results() {
        let results: Vec<LiveResult> = (0..10)
            .map(|i| LiveResult {
                title: format!("Result {i}"),
                url: format!("https://example.org/{i}"),
                snippet: String::new(),
            })
            .collect();
        let search = FixedSearch { results };
        let embedder = DeterministicEmbedder::new();
        let checker = LiveChecker::new(&search, &embedder, 3);

        let merged = checker
            .augment("query", RetrievalResult::default())
            .await
            .unwrap();
        assert_eq!(merged.len(), 3);
    }
}
