//! Terminal display surface backed by `rustyline`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use docqa::{DisplaySurface, Section};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

/// One line of user input at the question prompt.
#[derive(Debug, PartialEq)]
pub enum Input {
    Question(String),
    Load(PathBuf),
    Quit,
    Empty,
}

/// Interpret a prompt line. Lines starting with `/` are commands.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
        ("/quit" | "/exit", _) => Input::Quit,
        ("/load", path) if !path.trim().is_empty() => Input::Load(PathBuf::from(path.trim())),
        _ => Input::Question(line.to_string()),
    }
}

/// Read a document from disk.
pub fn read_document(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Format the sections an answer was drawn from as a numbered list.
///
/// Returns an empty string when nothing was retrieved.
pub fn format_references(retrieved: &[Section], preview_chars: usize) -> String {
    if retrieved.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nReferenced Documents:");
    for (i, section) in retrieved.iter().enumerate() {
        out.push_str(&format!("\n  Document {}: {}", i + 1, section.preview(preview_chars)));
    }
    out
}

/// Renders to stdout and reads from an interactive line editor.
pub struct TerminalSurface {
    editor: DefaultEditor,
    initial_document: Option<PathBuf>,
    pending_upload: Option<Vec<u8>>,
    preview_chars: usize,
}

impl TerminalSurface {
    pub fn new(initial_document: Option<PathBuf>, preview_chars: usize) -> anyhow::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new().context("failed to initialise line editor")?,
            initial_document,
            pending_upload: None,
            preview_chars,
        })
    }

    /// A document requested with `/load` while a session was active.
    pub fn take_pending_upload(&mut self) -> Option<Vec<u8>> {
        self.pending_upload.take()
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        warn!(error = %e, "failed to record input history");
                    }
                }
                Some(line)
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => None,
            Err(e) => {
                warn!(error = %e, "failed to read input");
                None
            }
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn render_user_message(&mut self, text: &str) {
        println!("\nQuestion: {text}");
    }

    fn render_assistant_message(&mut self, answer: &str, retrieved: &[Section]) {
        println!("Response: {answer}");
        let references = format_references(retrieved, self.preview_chars);
        if !references.is_empty() {
            println!("{references}");
        }
    }

    fn render_notice(&mut self, message: &str) {
        println!("! {message}");
    }

    fn request_document_upload(&mut self) -> Option<Vec<u8>> {
        if let Some(path) = self.initial_document.take() {
            match read_document(&path) {
                Ok(bytes) => return Some(bytes),
                Err(e) => self.render_notice(&format!("{e:#}")),
            }
        }

        loop {
            let line = self.read_line("Document path: ")?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }
            match read_document(Path::new(path)) {
                Ok(bytes) => return Some(bytes),
                Err(e) => self.render_notice(&format!("{e:#}")),
            }
        }
    }

    fn request_question_input(&mut self) -> Option<String> {
        loop {
            let line = self.read_line("> ")?;
            match parse_input(&line) {
                Input::Empty => continue,
                Input::Quit => return None,
                Input::Question(question) => return Some(question),
                Input::Load(path) => match read_document(&path) {
                    Ok(bytes) => {
                        self.pending_upload = Some(bytes);
                        return None;
                    }
                    Err(e) => self.render_notice(&format!("{e:#}")),
                },
            }
        }
    }
}
