use super::types::{ChatTurn, Policy, Role};
use crate::retrieval::RetrievalResult;

pub const GUIDELINE_SYSTEM_PROMPT: &str = r#"You are Veridex, a document evaluation assistant answering under submission guidelines.

ABSOLUTE RULES — NO EXCEPTIONS:
1. Ground EVERY statement in the provided context passages.
2. Cite a passage for every claim: [P: <passage-id>].
3. If the passages do not answer the question, say so clearly instead of guessing.
4. Never invent passage ids. Only cite ids that appear in the context block.
5. Express uncertainty when passages conflict or are incomplete.

CONTEXT PASSAGES:
The sections below contain the only material you may draw on. Each passage is
labelled with its id."#;

pub const SPECIALIST_SYSTEM_PROMPT: &str = r#"You are Veridex, a domain-specialist reviewer of research documents.

RULES:
1. You may apply specialist heuristics and background knowledge beyond the provided passages.
2. Whenever you do rely on a context passage, cite it: [P: <passage-id>].
3. Never invent passage ids. Only cite ids that appear in the context block.
4. Clearly separate what the passages establish from your own specialist judgement.

CONTEXT PASSAGES:
The sections below are retrieved reference material, each labelled with its id."#;

/// Maximum characters of user text carried into a prompt.
const MAX_QUESTION_CHARS: usize = 2000;

/// Turns of history included in the prompt.
const HISTORY_TURNS: usize = 4;

/// System prompt for a policy.
pub fn system_prompt(policy: Policy) -> &'static str {
    match policy {
        Policy::Guideline => GUIDELINE_SYSTEM_PROMPT,
        Policy::Specialist => SPECIALIST_SYSTEM_PROMPT,
    }
}

/// Build the grounded prompt: recent history, labelled context passages,
/// then the question.
pub fn build_grounded_prompt(
    question: &str,
    retrieval: &RetrievalResult,
    history: &[ChatTurn],
) -> String {
    let mut prompt = String::new();

    let recent: Vec<&ChatTurn> = history.iter().rev().take(HISTORY_TURNS).rev().collect();
    if !recent.is_empty() {
        prompt.push_str("<CONVERSATION_HISTORY>\n");
        for turn in recent {
            let role = match turn.role {
                Role::User => "User",
                Role::Assistant => "Veridex",
            };
            prompt.push_str(&format!("{}: {}\n", role, turn.text));
        }
        prompt.push_str("</CONVERSATION_HISTORY>\n\n");
    }

    prompt.push_str("<CONTEXT>\n");
    for entry in &retrieval.entries {
        prompt.push_str(&format!(
            "[P: {}] ({:?}, relevance {:.2})\n{}\n\n",
            entry.passage.id, entry.passage.source, entry.relevance, entry.passage.text
        ));
    }
    prompt.push_str("</CONTEXT>\n\n");

    prompt.push_str(&format!("Question: {}\n\n", sanitize_question(question)));
    prompt.push_str("Answer with inline [P: <passage-id>] citations.");

    prompt
}

/// Length-cap the question and strip control characters before it enters a
/// prompt.
pub fn sanitize_question(question: &str) -> String {
    question
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .take(MAX_QUESTION_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Response for a turn that retrieved nothing to ground on.
pub fn no_context_response() -> String {
    "I don't have any reference material matching that question yet. \
     Try rephrasing, or check that the relevant corpus scope is loaded."
        .to_string()
}
