//! Session orchestration.
//!
//! The [`SessionOrchestrator`] owns at most one [`Session`]: the knowledge
//! index and conversation memory for the currently loaded document. It is
//! `Idle` until a document is loaded and `Active` afterwards. Loading another
//! document replaces the whole session.
//!
//! Each question runs to completion before the next one is accepted:
//! retrieve, compose, record the turn, render.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa::{QaConfig, SessionOrchestrator};
//!
//! let mut orchestrator = SessionOrchestrator::builder()
//!     .config(QaConfig::default())
//!     .embedder(Arc::new(embedder))
//!     .completer(Arc::new(completer))
//!     .build()?;
//!
//! orchestrator.run(&mut surface).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::completion::Completer;
use crate::composer::AnswerComposer;
use crate::config::QaConfig;
use crate::document::Section;
use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::index::KnowledgeIndex;
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::retriever::Retriever;
use crate::sectioner::{Sectioner, decode_document};

/// Notice rendered when a question is asked against an empty index.
///
/// Documents loaded through [`SessionOrchestrator::load_document`] always
/// yield at least one section, so this is a fallback for when
/// [`QaError::EmptyIndex`] reaches [`SessionOrchestrator::run`].
pub const NO_INFORMATION_NOTICE: &str =
    "No information is available for this document. Upload a document with content to ask questions.";

/// The interactive display the orchestrator renders to and reads from.
///
/// Implemented by the host application; the orchestrator never renders on
/// its own.
pub trait DisplaySurface {
    /// Show the user's question.
    fn render_user_message(&mut self, text: &str);

    /// Show an answer together with the sections it was based on.
    fn render_assistant_message(&mut self, answer: &str, retrieved: &[Section]);

    /// Show a user-visible message for a recoverable error.
    fn render_notice(&mut self, message: &str);

    /// Ask for a document. `None` means no document was provided.
    fn request_document_upload(&mut self) -> Option<Vec<u8>>;

    /// Ask for the next question. `None` ends the conversation.
    fn request_question_input(&mut self) -> Option<String>;
}

/// The state of one loaded document: its index and its conversation.
#[derive(Debug)]
pub struct Session {
    index: KnowledgeIndex,
    memory: ConversationMemory,
}

impl Session {
    /// The knowledge index for the loaded document.
    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    /// The conversation so far.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}

/// Orchestrator state.
#[derive(Debug, Default)]
pub enum SessionState {
    /// No document loaded.
    #[default]
    Idle,
    /// A document is loaded and indexed.
    Active(Session),
}

/// Ties sectioning, indexing, retrieval, answering and memory together.
///
/// Construct one via [`SessionOrchestrator::builder()`].
#[derive(Debug)]
pub struct SessionOrchestrator {
    config: QaConfig,
    sectioner: Sectioner,
    retriever: Retriever,
    composer: AnswerComposer,
    state: SessionState,
}

impl SessionOrchestrator {
    /// Create a new [`SessionOrchestratorBuilder`].
    pub fn builder() -> SessionOrchestratorBuilder {
        SessionOrchestratorBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Return the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Return the active session, if a document is loaded.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::Idle => None,
        }
    }

    /// Whether a document is loaded.
    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    /// Prior turns of the active session, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        self.session().map(|s| s.memory.history()).unwrap_or_default()
    }

    /// Load a document and start a fresh session for it.
    ///
    /// Any previous index and conversation are discarded once the new index
    /// has been built. On failure the previous state is left untouched.
    ///
    /// Returns the number of indexed sections.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidDocument`] if the bytes are not UTF-8 text,
    /// or [`QaError::EmbeddingProvider`] if indexing fails.
    pub async fn load_document(&mut self, bytes: &[u8]) -> Result<usize> {
        let text = decode_document(bytes)?;
        let sections = self.sectioner.split(&text);
        let section_count = sections.len();

        let index = KnowledgeIndex::build(sections, self.retriever.embedder().as_ref()).await?;

        let replaced = self.is_active();
        self.state = SessionState::Active(Session {
            index,
            memory: ConversationMemory::with_max_turns(self.config.max_turns),
        });
        info!(section_count, replaced, "document loaded");
        Ok(section_count)
    }

    /// Run one question through the turn cycle and render the result.
    ///
    /// The turn is recorded only after an answer has been produced; a failed
    /// question leaves the memory unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::NoDocument`] if no document is loaded,
    /// [`QaError::EmptyIndex`] if the document has no sections, and the
    /// provider errors of retrieval and composition.
    pub async fn ask(
        &mut self,
        question: &str,
        surface: &mut dyn DisplaySurface,
    ) -> Result<&ConversationTurn> {
        let session = match &mut self.state {
            SessionState::Active(session) => session,
            SessionState::Idle => return Err(QaError::NoDocument),
        };

        surface.render_user_message(question);

        let query = if self.config.condense_questions {
            self.composer.condense(question, session.memory.history()).await?
        } else {
            question.to_string()
        };

        let retrieved = self.retriever.retrieve(&session.index, &query, self.config.top_k).await?;
        let answer = self.composer.compose(&query, &retrieved, session.memory.history()).await?;

        let turn = session.memory.append(ConversationTurn::new(question, answer, retrieved));
        surface.render_assistant_message(&turn.answer, &turn.retrieved);
        info!(turn = turn.order, sections = turn.retrieved.len(), "turn completed");
        Ok(turn)
    }

    /// Drive the conversation from the surface until it stops providing input.
    ///
    /// While idle, requests a document; once active, requests questions.
    /// Recoverable errors are rendered as notices and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error.
    pub async fn run(&mut self, surface: &mut dyn DisplaySurface) -> Result<()> {
        loop {
            if !self.is_active() {
                let Some(bytes) = surface.request_document_upload() else {
                    return Ok(());
                };
                if let Err(e) = self.load_document(&bytes).await {
                    report(e, surface)?;
                }
                continue;
            }

            let Some(question) = surface.request_question_input() else {
                return Ok(());
            };
            if let Err(e) = self.ask(&question, surface).await {
                report(e, surface)?;
            }
        }
    }
}

/// Render a recoverable error as a notice, or hand back a fatal one.
fn report(e: QaError, surface: &mut dyn DisplaySurface) -> Result<()> {
    match e {
        QaError::EmptyIndex => {
            warn!("question asked against an empty index");
            surface.render_notice(NO_INFORMATION_NOTICE);
            Ok(())
        }
        e if e.is_recoverable() => {
            warn!(error = %e, "turn failed");
            surface.render_notice(&e.to_string());
            Ok(())
        }
        e => {
            error!(error = %e, "session stopped");
            Err(e)
        }
    }
}

/// Builder for constructing a [`SessionOrchestrator`].
///
/// The embedder and completer are required; the config defaults to
/// [`QaConfig::default()`].
#[derive(Default)]
pub struct SessionOrchestratorBuilder {
    config: Option<QaConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    completer: Option<Arc<dyn Completer>>,
}

impl SessionOrchestratorBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: QaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for both indexing and queries.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the completion provider.
    pub fn completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Build the orchestrator in the `Idle` state.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if a provider is missing or the config is
    /// invalid.
    pub fn build(self) -> Result<SessionOrchestrator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder =
            self.embedder.ok_or_else(|| QaError::Config("embedder is required".to_string()))?;
        let completer =
            self.completer.ok_or_else(|| QaError::Config("completer is required".to_string()))?;

        Ok(SessionOrchestrator {
            sectioner: Sectioner::new(config.delimiter.clone()),
            retriever: Retriever::new(embedder),
            composer: AnswerComposer::new(completer),
            config,
            state: SessionState::Idle,
        })
    }
}
