//! Data types for sections, indexed vectors, and search results.

use serde::{Deserialize, Serialize};

/// A contiguous piece of the source document produced by delimiter splitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    /// Position of the section in the document, 0-based.
    pub index: usize,
    /// The text of the section, untrimmed.
    pub text: String,
}

impl Section {
    /// Create a section at the given position.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }

    /// Return at most `max_chars` characters of the text, followed by `...`
    /// when the text was cut.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docqa::Section;
    ///
    /// let section = Section::new(0, "Project Alpha info");
    /// assert_eq!(section.preview(7), "Project...");
    /// assert_eq!(section.preview(100), "Project Alpha info");
    /// ```
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

/// A [`Section`] paired with its embedding and an index-assigned identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedVector {
    /// Identifier assigned by the index at insertion time.
    pub id: String,
    /// The section this vector was computed from.
    pub section: Section,
    /// The embedding vector for the section's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Section`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved section.
    pub section: Section,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
