//! Configuration for a question-answering session.

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};
use crate::sectioner::DEFAULT_DELIMITER;

/// Configuration parameters for the session orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaConfig {
    /// Literal token separating sections in an uploaded document.
    pub delimiter: String,
    /// Number of sections retrieved per question.
    pub top_k: usize,
    /// Sampling temperature passed to the completion provider.
    pub temperature: f32,
    /// Maximum number of turns kept in memory; `None` keeps every turn.
    pub max_turns: Option<usize>,
    /// Rewrite follow-up questions into standalone questions before retrieval.
    pub condense_questions: bool,
    /// Characters shown per referenced section when rendering an answer.
    pub preview_chars: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            top_k: 5,
            temperature: 0.0,
            max_turns: None,
            condense_questions: false,
            preview_chars: 200,
        }
    }
}

impl QaConfig {
    /// Create a new builder for constructing a [`QaConfig`].
    pub fn builder() -> QaConfigBuilder {
        QaConfigBuilder::default()
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if:
    /// - `delimiter` is empty
    /// - `top_k == 0`
    /// - `max_turns == Some(0)`
    /// - `temperature` is outside `0.0..=2.0`
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(QaError::Config("delimiter must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(QaError::Config("top_k must be greater than zero".to_string()));
        }
        if self.max_turns == Some(0) {
            return Err(QaError::Config("max_turns must be greater than zero when set".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(QaError::Config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`QaConfig`].
#[derive(Debug, Clone, Default)]
pub struct QaConfigBuilder {
    config: QaConfig,
}

impl QaConfigBuilder {
    /// Set the section delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    /// Set the number of sections retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the completion temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Cap the number of turns kept in memory.
    pub fn max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.config.max_turns = max_turns;
        self
    }

    /// Enable or disable standalone question condensing.
    pub fn condense_questions(mut self, enabled: bool) -> Self {
        self.config.condense_questions = enabled;
        self
    }

    /// Set the preview length for referenced sections.
    pub fn preview_chars(mut self, chars: usize) -> Self {
        self.config.preview_chars = chars;
        self
    }

    /// Build the [`QaConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`QaConfig::validate`].
    pub fn build(self) -> Result<QaConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
