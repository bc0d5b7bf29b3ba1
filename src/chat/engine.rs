use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::citation::{calculate_confidence, clean_citations_for_display, extract_citations};
use super::prompt::{build_grounded_prompt, no_context_response, sanitize_question, system_prompt};
use super::store::ConversationStore;
use super::types::{ChatTurn, Policy};
use super::ChatError;
use crate::corpus::index::CorpusIndex;
use crate::embedding::EmbeddingModel;
use crate::generation::{GenerationError, LlmGenerate};
use crate::retrieval::retriever::Retriever;

/// Phases of a single turn. `Answered` is terminal; `Failed` is reachable
/// from `Retrieving` and `Generating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Retrieving,
    Generating,
    Answered,
    Failed,
}

/// Engine configuration shared by both policy variants.
#[derive(Debug, Clone)]
pub struct ChatEngineConfig {
    /// Corpus scope retrieved for guideline-constrained turns.
    pub guideline_scope: String,
    /// Corpus scope retrieved for specialist turns.
    pub specialist_scope: String,
    pub top_k: usize,
    pub generation_timeout: Duration,
}

impl Default for ChatEngineConfig {
    fn default() -> Self {
        Self {
            guideline_scope: "guidelines".to_string(),
            specialist_scope: "papers".to_string(),
            top_k: crate::config::DEFAULT_TOP_K,
            generation_timeout: Duration::from_secs(crate::config::DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

/// Grounded chat over retrieved passages.
///
/// One state machine for both policies; the policy only selects the system
/// prompt, the retrieval scope, and the citation requirement. A turn commits
/// to the conversation only after generation and citation checks succeed, so
/// a cancelled or failed turn leaves the conversation unchanged.
pub struct ChatEngine {
    index: Arc<CorpusIndex>,
    embedder: Arc<dyn EmbeddingModel>,
    generator: Arc<dyn LlmGenerate>,
    store: ConversationStore,
    config: ChatEngineConfig,
}

impl ChatEngine {
    pub fn new(
        index: Arc<CorpusIndex>,
        embedder: Arc<dyn EmbeddingModel>,
        generator: Arc<dyn LlmGenerate>,
        config: ChatEngineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            store: ConversationStore::new(),
            config,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    fn scope_for(&self, policy: Policy) -> &str {
        match policy {
            Policy::Guideline => &self.config.guideline_scope,
            Policy::Specialist => &self.config.specialist_scope,
        }
    }

    /// Run one turn: retrieve, generate under the policy's constraints,
    /// derive citations from the retrieval result, commit, answer.
    pub async fn respond(
        &self,
        conversation_id: Uuid,
        user_text: &str,
        policy: Policy,
    ) -> Result<ChatTurn, ChatError> {
        // Serialization point: turns on this id queue here in submission
        // order; other conversations are unaffected.
        let handle = self.store.handle(conversation_id);
        let mut conversation = handle.lock().await;

        let mut state = TurnState::Idle;
        tracing::trace!(%conversation_id, ?policy, ?state, "turn accepted");

        let question = sanitize_question(user_text);

        state = TurnState::Retrieving;
        tracing::debug!(%conversation_id, ?policy, ?state, "turn started");

        let query_embedding = self
            .embedder
            .embed(&question)
            .await
            .map_err(|e| self.fail(conversation_id, state, e.into()))?;

        let retrieval = Retriever::new(&self.index)
            .retrieve(&query_embedding, self.scope_for(policy), self.config.top_k)
            .map_err(|e| self.fail(conversation_id, state, e.into()))?;

        if retrieval.is_empty() {
            // Nothing to ground on: answer honestly with zero citations.
            let turn = ChatTurn::assistant(no_context_response(), Vec::new(), 0.0);
            conversation.turns.push(ChatTurn::user(question));
            conversation.turns.push(turn.clone());
            tracing::debug!(%conversation_id, "turn answered without context");
            return Ok(turn);
        }

        state = TurnState::Generating;
        let prompt = build_grounded_prompt(&question, &retrieval, &conversation.turns);

        let raw_answer = match tokio::time::timeout(
            self.config.generation_timeout,
            self.generator.generate(system_prompt(policy), &prompt),
        )
        .await
        {
            Err(_elapsed) => {
                let timeout = GenerationError::Timeout(self.config.generation_timeout.as_secs());
                return Err(self.fail(conversation_id, state, timeout.into()));
            }
            Ok(result) => result.map_err(|e| self.fail(conversation_id, state, e.into()))?,
        };

        let citations = extract_citations(&raw_answer, &retrieval);

        // Guideline answers over a non-empty context must be grounded in at
        // least one retrieved passage.
        if policy == Policy::Guideline && citations.is_empty() {
            return Err(self.fail(
                conversation_id,
                state,
                ChatError::PolicyViolation(
                    "guideline answer cited no retrieved passage".to_string(),
                ),
            ));
        }

        let display_text = clean_citations_for_display(&raw_answer);
        let confidence = calculate_confidence(citations.len(), retrieval.len());
        let turn = ChatTurn::assistant(display_text, citations, confidence);

        // Commit only now; everything above can be dropped without leaving
        // a partial turn behind.
        conversation.turns.push(ChatTurn::user(question));
        conversation.turns.push(turn.clone());

        state = TurnState::Answered;
        tracing::debug!(%conversation_id, ?state, citations = turn.citations.len(), "turn answered");

        Ok(turn)
    }

    fn fail(&self, conversation_id: Uuid, state: TurnState, error: ChatError) -> ChatError {
        tracing::warn!(
            %conversation_id,
            failed_from = ?state,
            retryable = error.is_retryable(),
            error = %error,
            "turn failed"
        );
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::passage::{Passage, PassageSource};
    use crate::embedding::embedder::DeterministicEmbedder;
    use async_trait::async_trait;

    /// Canned generator; optionally slow, to exercise ordering and timeout.
    struct MockLlm {
        response: String,
        delay: Duration,
    }

    impl MockLlm {
        fn citing(passage_id: &str) -> Self {
            Self {
                response: format!("Grounded answer [P: {passage_id}]."),
                delay: Duration::ZERO,
            }
        }

        fn uncited() -> Self {
            Self {
                response: "An answer without any citation.".to_string(),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl LlmGenerate for MockLlm {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.response.clone())
        }
    }

    fn test_index() -> Arc<CorpusIndex> {
        let mut index = CorpusIndex::new();
        index.insert_scope(
            "guidelines",
            vec![Passage::new(
                "guidelines:format:0000",
                Uuid::new_v4(),
                "Proposals must include a budget table.",
                PassageSource::Reference,
                Some(vec![1.0, 0.0]),
            )],
        );
        index.insert_scope(
            "papers",
            vec![Passage::new(
                "papers:prior:0000",
                Uuid::new_v4(),
                "Prior work achieved 91% accuracy.",
                PassageSource::Reference,
                Some(vec![1.0, 0.0]),
            )],
        );
        index.insert_scope("empty", vec![]);
        index
    }

    fn engine_with(generator: MockLlm) -> ChatEngine {
        ChatEngine::new(
            test_index(),
            Arc::new(DeterministicEmbedder::with_dimension(2)),
            Arc::new(generator),
            ChatEngineConfig {
                generation_timeout: Duration::from_secs(5),
                ..ChatEngineConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn guideline_turn_answers_with_citations() {
        let engine = engine_with(MockLlm::citing("guidelines:format:0000"));
        let conv_id = Uuid::new_v4();

        let turn = engine
            .respond(conv_id, "What must proposals include?", Policy::Guideline)
            .await
            .unwrap();

        assert_eq!(turn.cited_ids(), vec!["guidelines:format:0000"]);
        assert!(!turn.text.contains("[P:"));
        assert!(turn.confidence.unwrap() > 0.0);

        let history = engine.store().history(conv_id).await;
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn citations_never_reference_unretrieved_passages() {
        // Generator cites a passage from a scope this policy never retrieves.
        let engine = engine_with(MockLlm::citing("papers:prior:0000"));

        let err = engine
            .respond(Uuid::new_v4(), "What must proposals include?", Policy::Guideline)
            .await
            .unwrap_err();

        // The fabricated id was dropped, leaving a guideline answer with no
        // citations — a policy violation, not a fabricated citation.
        assert!(matches!(err, ChatError::PolicyViolation(_)));
    }

    #[tokio::test]
    async fn uncited_guideline_answer_is_policy_violation() {
        let engine = engine_with(MockLlm::uncited());
        let conv_id = Uuid::new_v4();

        let err = engine
            .respond(conv_id, "What must proposals include?", Policy::Guideline)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::PolicyViolation(_)));
        assert!(!err.is_retryable());

        // Failed turn committed nothing.
        assert!(engine.store().history(conv_id).await.is_empty());
    }

    #[tokio::test]
    async fn uncited_specialist_answer_is_allowed() {
        let engine = engine_with(MockLlm::uncited());

        let turn = engine
            .respond(Uuid::new_v4(), "Is this approach sound?", Policy::Specialist)
            .await
            .unwrap();
        assert!(turn.citations.is_empty());
    }

    #[tokio::test]
    async fn empty_scope_answers_without_context() {
        let mut engine = engine_with(MockLlm::uncited());
        engine.config.guideline_scope = "empty".to_string();
        let conv_id = Uuid::new_v4();

        let turn = engine
            .respond(conv_id, "Anything?", Policy::Guideline)
            .await
            .unwrap();
        assert!(turn.citations.is_empty());
        assert_eq!(turn.confidence, Some(0.0));
        assert_eq!(engine.store().history(conv_id).await.len(), 2);
    }

    #[tokio::test]
    async fn generation_timeout_is_retryable_and_commits_nothing() {
        let mut engine =
            engine_with(MockLlm::citing("guidelines:format:0000").with_delay(Duration::from_secs(60)));
        engine.config.generation_timeout = Duration::from_millis(20);
        let conv_id = Uuid::new_v4();

        let err = engine
            .respond(conv_id, "What must proposals include?", Policy::Guideline)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChatError::Generation(GenerationError::Timeout(_))
        ));
        assert!(err.is_retryable());
        assert!(engine.store().history(conv_id).await.is_empty());
    }

    #[tokio::test]
    async fn cancelled_turn_leaves_conversation_unchanged() {
        let engine = Arc::new(engine_with(
            MockLlm::citing("guidelines:format:0000").with_delay(Duration::from_millis(200)),
        ));
        let conv_id = Uuid::new_v4();

        let task = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .respond(conv_id, "What must proposals include?", Policy::Guideline)
                    .await
            })
        };

        // Cancel mid-generation.
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();
        let _ = task.await;

        assert!(engine.store().history(conv_id).await.is_empty());
    }

    #[tokio::test]
    async fn same_conversation_turns_apply_in_submission_order() {
        // First turn is slow; second must queue behind it, not overtake.
        let slow_engine = Arc::new(engine_with(
            MockLlm::citing("guidelines:format:0000").with_delay(Duration::from_millis(100)),
        ));
        let conv_id = Uuid::new_v4();

        let first = {
            let engine = slow_engine.clone();
            tokio::spawn(async move {
                engine.respond(conv_id, "first question", Policy::Guideline).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let engine = slow_engine.clone();
            tokio::spawn(async move {
                engine.respond(conv_id, "second question", Policy::Guideline).await
            })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let history = slow_engine.store().history(conv_id).await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].text, "first question");
        assert_eq!(history[2].text, "second question");
    }

    #[tokio::test]
    async fn distinct_conversations_proceed_independently() {
        let engine = Arc::new(engine_with(
            MockLlm::citing("guidelines:format:0000").with_delay(Duration::from_millis(150)),
        ));

        let slow_id = Uuid::new_v4();
        let fast_id = Uuid::new_v4();

        let slow = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.respond(slow_id, "slow", Policy::Guideline).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = std::time::Instant::now();
        engine
            .respond(fast_id, "fast", Policy::Guideline)
            .await
            .unwrap();
        // The fast conversation waited for its own generation only, not the
        // slow conversation's lock — but both share the 150ms generator, so
        // just assert it did not serialize behind the slow turn twice over.
        assert!(started.elapsed() < Duration::from_millis(400));

        slow.await.unwrap().unwrap();
    }
}
