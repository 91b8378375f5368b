//! `docqa` - ask questions about a sectioned text document from the terminal.
//!
//! Reads `GOOGLE_API_KEY` and `GROQ_API_KEY` from the environment or a `.env`
//! file. Inside the prompt, `/load <FILE>` switches to another document and
//! `/quit` exits.

mod surface;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use docqa::gemini::GeminiEmbedder;
use docqa::groq::GroqCompleter;
use docqa::{DisplaySurface, QaConfig, SessionOrchestrator};
use tracing_subscriber::EnvFilter;

use crate::surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Conversational Q&A over a text document")]
struct Cli {
    /// Document to load on start. Prompts for a path when omitted.
    file: Option<PathBuf>,

    /// Literal token separating sections in the document.
    #[arg(long, default_value = docqa::DEFAULT_DELIMITER)]
    delimiter: String,

    /// Number of sections retrieved per question.
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Completion temperature.
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Keep at most this many turns of conversation history.
    #[arg(long)]
    max_turns: Option<usize>,

    /// Rewrite follow-up questions into standalone questions before retrieval.
    #[arg(long)]
    condense: bool,

    /// Characters shown per referenced section.
    #[arg(long, default_value_t = 200)]
    preview_chars: usize,

    /// Embedding model.
    #[arg(long, default_value = "models/embedding-001")]
    embedding_model: String,

    /// Completion model.
    #[arg(long, default_value = "llama3-70b-8192")]
    completion_model: String,

    /// Per-request provider timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let config = QaConfig::builder()
        .delimiter(cli.delimiter)
        .top_k(cli.top_k)
        .temperature(cli.temperature)
        .max_turns(cli.max_turns)
        .condense_questions(cli.condense)
        .preview_chars(cli.preview_chars)
        .build()?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    let embedder =
        GeminiEmbedder::from_env()?.with_model(cli.embedding_model).with_timeout(timeout)?;
    let completer = GroqCompleter::from_env()?
        .with_model(cli.completion_model)
        .with_temperature(config.temperature)
        .with_timeout(timeout)?;

    let mut surface = TerminalSurface::new(cli.file, config.preview_chars)?;
    let mut orchestrator = SessionOrchestrator::builder()
        .config(config)
        .embedder(Arc::new(embedder))
        .completer(Arc::new(completer))
        .build()?;

    println!("Project QA Chatbot - /load <FILE> to switch documents, /quit to exit.");
    loop {
        orchestrator.run(&mut surface).await?;

        // `run` returns when input ends or when `/load` queued a replacement.
        let Some(bytes) = surface.take_pending_upload() else {
            break;
        };
        match orchestrator.load_document(&bytes).await {
            Ok(sections) => println!("Loaded document with {sections} section(s)."),
            Err(e) => surface.render_notice(&e.to_string()),
        }
    }

    Ok(())
}
