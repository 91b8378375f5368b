//! Delimiter-based document sectioning.
//!
//! Documents are split on every literal occurrence of a delimiter. Pieces are
//! kept exactly as they appear, so re-joining the sections with the delimiter
//! reproduces the original text.

use crate::document::Section;
use crate::error::{QaError, Result};

/// The delimiter separating sections in an uploaded document: ten `#`s.
pub const DEFAULT_DELIMITER: &str = "##########";

/// Split `text` on every literal occurrence of `delimiter`.
///
/// Empty pieces (leading, trailing, or consecutive delimiters) are retained
/// as empty sections. A text without the delimiter yields one section equal
/// to the whole text, including the empty text.
///
/// An empty delimiter never matches; the whole text becomes one section.
///
/// # Example
///
/// ```rust
/// use docqa::sectioner::{split, DEFAULT_DELIMITER};
///
/// let sections = split("Project Alpha info##########Project Beta info", DEFAULT_DELIMITER);
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[1].text, "Project Beta info");
/// ```
pub fn split(text: &str, delimiter: &str) -> Vec<Section> {
    if delimiter.is_empty() {
        return vec![Section::new(0, text)];
    }
    text.split(delimiter).enumerate().map(|(index, piece)| Section::new(index, piece)).collect()
}

/// Splits documents with a fixed delimiter.
#[derive(Debug, Clone)]
pub struct Sectioner {
    delimiter: String,
}

impl Sectioner {
    /// Create a sectioner for the given delimiter.
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self { delimiter: delimiter.into() }
    }

    /// The delimiter this sectioner splits on.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split a document into sections.
    pub fn split(&self, text: &str) -> Vec<Section> {
        split(text, &self.delimiter)
    }
}

impl Default for Sectioner {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

/// Decode uploaded document bytes as UTF-8 text.
///
/// # Errors
///
/// Returns [`QaError::InvalidDocument`] if the bytes are not valid UTF-8.
pub fn decode_document(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        QaError::InvalidDocument(format!("document is not valid UTF-8 text: {e}"))
    })
}
