//! Prompt construction and answer generation.
//!
//! The answer prompt is a fixed template. It is filled with the retrieved
//! sections as context, the prior turns as chat history, and the current
//! question, in that order, and sent to the [`Completer`] in one call.

use std::sync::Arc;

use tracing::{debug, error};

use crate::completion::Completer;
use crate::document::Section;
use crate::error::Result;
use crate::memory::ConversationTurn;

/// Instructions and answer format for the assistant.
///
/// Placeholders: `{context}`, `{chat_history}`, `{question}`.
pub const ANSWER_TEMPLATE: &str = "\
You are a knowledgeable assistant for a service-based company, with access to relevant clients' project information.
Based on the given query and context, provide a concise, detailed response using the most relevant information available.
When discussing projects, structure your response in the following format:

Project Name: [Project Name]
Project Overview: [Brief description of the project's goals and methods]
Algorithms Tried: [List and briefly describe the algorithms used]
Best Performing Algorithm: [State the best performing algorithm and why it was chosen]
Key Metrics:
    - [Metric 1]: [Value]
    - [Metric 2]: [Value]
    - [Metric 3]: [Value]
    ...
Next Steps: [Describe the planned next steps for the project]

If the query asks about a general topic (e.g., \"Have we done anything on air quality improvement?\"),
identify and discuss multiple relevant projects in the above format, if available.
If a relevant project is found but does not perfectly match the query, mention it briefly and explain how it relates to the query.
If no directly relevant projects are found, provide a concise answer based on the available context and suggest potential next steps.

Context: {context}

Chat History:
{chat_history}

Question: {question}

Answer:
";

/// Rewrites a follow-up question so it can be understood without the history.
///
/// Placeholders: `{chat_history}`, `{question}`.
pub const CONDENSE_TEMPLATE: &str = "\
Rewrite the follow-up question below as a single standalone question that can be understood without the conversation. Keep the original language. Reply with the question only.

Chat History:
{chat_history}

Follow-up question: {question}

Standalone question:";

const EMPTY_HISTORY: &str = "(no previous questions)";

/// Builds answer prompts and sends them to a [`Completer`].
#[derive(Clone)]
pub struct AnswerComposer {
    completer: Arc<dyn Completer>,
}

impl AnswerComposer {
    /// Create a composer over the given completer.
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Return a reference to the completer.
    pub fn completer(&self) -> &Arc<dyn Completer> {
        &self.completer
    }

    /// Answer `question` from the retrieved sections and prior turns.
    ///
    /// Returns the completion text unmodified. `history` is only read.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::CompletionProvider`](crate::QaError::CompletionProvider)
    /// if the completion call fails. Nothing is retried.
    pub async fn compose(
        &self,
        question: &str,
        retrieved: &[Section],
        history: &[ConversationTurn],
    ) -> Result<String> {
        let prompt = render_answer_prompt(question, retrieved, history);
        debug!(
            provider = self.completer.name(),
            prompt_len = prompt.len(),
            context_sections = retrieved.len(),
            history_turns = history.len(),
            "composing answer"
        );
        self.completer.complete(&prompt).await.map_err(|e| {
            error!(provider = self.completer.name(), error = %e, "answer completion failed");
            e
        })
    }

    /// Rewrite `question` as a standalone question using `history`.
    ///
    /// With no history the question is returned as-is and no call is made.
    /// A blank rewrite also falls back to the original question.
    pub async fn condense(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let chat_history = render_history(history);
        let prompt = fill_template(
            CONDENSE_TEMPLATE,
            &[("chat_history", chat_history.as_str()), ("question", question)],
        );
        let rewritten = self.completer.complete(&prompt).await.map_err(|e| {
            error!(provider = self.completer.name(), error = %e, "question condensing failed");
            e
        })?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }
        debug!(original = question, standalone = rewritten, "condensed follow-up question");
        Ok(rewritten.to_string())
    }
}

impl std::fmt::Debug for AnswerComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerComposer").field("completer", &self.completer.name()).finish()
    }
}

/// Fill [`ANSWER_TEMPLATE`] for one question.
pub fn render_answer_prompt(
    question: &str,
    retrieved: &[Section],
    history: &[ConversationTurn],
) -> String {
    let context = retrieved.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("\n\n");
    let chat_history = render_history(history);
    fill_template(
        ANSWER_TEMPLATE,
        &[
            ("context", context.as_str()),
            ("chat_history", chat_history.as_str()),
            ("question", question),
        ],
    )
}

/// Render turns as alternating `Human:` / `Assistant:` lines.
fn render_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    history
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute `{name}` placeholders in one pass.
///
/// Substituted values are never rescanned, so braces inside the document or
/// the question come through untouched. Unknown placeholders are kept.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substitution = after.find('}').and_then(|close| {
            let name = &after[..close];
            values.iter().find(|(key, _)| *key == name).map(|(_, value)| (*value, close))
        });
        match substitution {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
