//! # docqa
//!
//! Conversational question answering over a single text document.
//!
//! ## Overview
//!
//! A document is split into sections on a literal delimiter, each section is
//! embedded into an in-memory [`KnowledgeIndex`], and every question is
//! answered by retrieving the most similar sections and handing them to a
//! language model together with the conversation so far.
//!
//! - [`sectioner`] - delimiter-based splitting
//! - [`KnowledgeIndex`] - all-or-nothing index build and similarity search
//! - [`Retriever`] - query embedding and top-k lookup
//! - [`ConversationMemory`] - append-only log of answered turns
//! - [`AnswerComposer`] - structured answer prompt and completion call
//! - [`SessionOrchestrator`] - the per-document session and turn cycle
//!
//! Providers sit behind the [`Embedder`] and [`Completer`] traits. With the
//! default features, [`gemini::GeminiEmbedder`] and [`groq::GroqCompleter`]
//! are available.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa::{QaConfig, SessionOrchestrator};
//! use docqa::gemini::GeminiEmbedder;
//! use docqa::groq::GroqCompleter;
//!
//! let config = QaConfig::default();
//! let mut orchestrator = SessionOrchestrator::builder()
//!     .embedder(Arc::new(GeminiEmbedder::from_env()?))
//!     .completer(Arc::new(GroqCompleter::from_env()?.with_temperature(config.temperature)))
//!     .config(config)
//!     .build()?;
//!
//! orchestrator.load_document(std::fs::read("projects.txt")?.as_slice()).await?;
//! let turn = orchestrator.ask("Have we done anything on air quality?", &mut surface).await?;
//! println!("{}", turn.answer);
//! ```

pub mod completion;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "groq")]
pub mod groq;
pub mod index;
pub mod memory;
pub mod retriever;
pub mod sectioner;
pub mod session;

pub use completion::Completer;
pub use composer::AnswerComposer;
pub use config::{QaConfig, QaConfigBuilder};
pub use document::{IndexedVector, SearchResult, Section};
pub use embedding::Embedder;
pub use error::{QaError, Result};
pub use index::KnowledgeIndex;
pub use memory::{ConversationMemory, ConversationTurn};
pub use retriever::Retriever;
pub use sectioner::{DEFAULT_DELIMITER, Sectioner};
pub use session::{
    DisplaySurface, NO_INFORMATION_NOTICE, Session, SessionOrchestrator,
    SessionOrchestratorBuilder, SessionState,
};
