//! Deterministic providers and a recording display surface for tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docqa::{Completer, DisplaySurface, Embedder, QaError, Section};

/// Embeds text as keyword counts over a fixed vocabulary.
///
/// Texts sharing keywords with a query score higher, which makes retrieval
/// order predictable.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "Keyword"
    }

    async fn embed(&self, text: &str) -> docqa::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(QaError::EmbeddingProvider {
                provider: "Keyword".into(),
                message: "quota exceeded".into(),
            });
        }
        let lower = text.to_lowercase();
        Ok(self.vocabulary.iter().map(|word| lower.matches(word).count() as f32).collect())
    }
}

/// Embeds every text as the same vector, so all scores tie.
pub struct ConstantEmbedder;

#[async_trait]
impl Embedder for ConstantEmbedder {
    fn name(&self) -> &str {
        "Constant"
    }

    async fn embed(&self, _text: &str) -> docqa::Result<Vec<f32>> {
        Ok(vec![1.0, 1.0])
    }
}

/// Replies from a queue (or echoes a fixed answer) and records every prompt.
#[derive(Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, prompt: &str) -> docqa::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(QaError::CompletionProvider {
                provider: "Scripted".into(),
                message: "timed out".into(),
            });
        }
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(|| "default answer".to_string()))
    }
}

/// Something the orchestrator rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    User(String),
    Assistant { answer: String, sections: Vec<Section> },
    Notice(String),
}

/// A display surface fed from queues that records what it renders.
#[derive(Default)]
pub struct RecordingSurface {
    pub uploads: VecDeque<Vec<u8>>,
    pub questions: VecDeque<String>,
    pub rendered: Vec<Rendered>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(mut self, document: impl Into<Vec<u8>>) -> Self {
        self.uploads.push_back(document.into());
        self
    }

    pub fn with_question(mut self, question: &str) -> Self {
        self.questions.push_back(question.to_string());
        self
    }

    pub fn answers(&self) -> Vec<&str> {
        self.rendered
            .iter()
            .filter_map(|r| match r {
                Rendered::Assistant { answer, .. } => Some(answer.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<&str> {
        self.rendered
            .iter()
            .filter_map(|r| match r {
                Rendered::Notice(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySurface for RecordingSurface {
    fn render_user_message(&mut self, text: &str) {
        self.rendered.push(Rendered::User(text.to_string()));
    }

    fn render_assistant_message(&mut self, answer: &str, retrieved: &[Section]) {
        self.rendered
            .push(Rendered::Assistant { answer: answer.to_string(), sections: retrieved.to_vec() });
    }

    fn render_notice(&mut self, message: &str) {
        self.rendered.push(Rendered::Notice(message.to_string()));
    }

    fn request_document_upload(&mut self) -> Option<Vec<u8>> {
        self.uploads.pop_front()
    }

    fn request_question_input(&mut self) -> Option<String> {
        self.questions.pop_front()
    }
}

pub const PROJECTS: &str = "Project Alpha: air quality sensors##########Project Beta: churn prediction##########Project Gamma: air pollution forecasting";

pub fn projects_embedder() -> Arc<KeywordEmbedder> {
    Arc::new(KeywordEmbedder::new(&["alpha", "beta", "gamma", "air", "churn", "pollution"]))
}
