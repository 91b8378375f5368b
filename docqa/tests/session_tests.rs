//! End-to-end tests of the session turn cycle with deterministic providers.

mod common;

use std::sync::Arc;

use common::{
    ConstantEmbedder, KeywordEmbedder, PROJECTS, RecordingSurface, Rendered, ScriptedCompleter,
    projects_embedder,
};
use docqa::{
    KnowledgeIndex, QaConfig, QaError, Retriever, Section, SessionOrchestrator, SessionState,
};

fn orchestrator(
    embedder: Arc<KeywordEmbedder>,
    completer: Arc<ScriptedCompleter>,
    config: QaConfig,
) -> SessionOrchestrator {
    SessionOrchestrator::builder()
        .config(config)
        .embedder(embedder)
        .completer(completer)
        .build()
        .unwrap()
}

fn texts(sections: &[Section]) -> Vec<&str> {
    sections.iter().map(|s| s.text.as_str()).collect()
}

#[tokio::test]
async fn answers_question_from_most_similar_sections() {
    let completer = Arc::new(ScriptedCompleter::new());
    completer.push_reply("Project Name: Alpha");
    let config = QaConfig::builder().top_k(2).build().unwrap();
    let mut orchestrator = orchestrator(projects_embedder(), completer.clone(), config);
    let mut surface = RecordingSurface::new();

    assert_eq!(orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap(), 3);
    let turn = orchestrator.ask("Anything on air quality?", &mut surface).await.unwrap();

    assert_eq!(turn.order, 0);
    assert_eq!(turn.answer, "Project Name: Alpha");
    assert_eq!(
        texts(&turn.retrieved),
        vec!["Project Alpha: air quality sensors", "Project Gamma: air pollution forecasting"]
    );

    let prompt = completer.last_prompt().unwrap();
    assert!(prompt.contains("Project Alpha: air quality sensors"));
    assert!(!prompt.contains("churn prediction"));
    assert!(prompt.contains("Question: Anything on air quality?"));

    assert_eq!(
        surface.rendered,
        vec![
            Rendered::User("Anything on air quality?".into()),
            Rendered::Assistant {
                answer: "Project Name: Alpha".into(),
                sections: vec![
                    Section::new(0, "Project Alpha: air quality sensors"),
                    Section::new(2, "Project Gamma: air pollution forecasting"),
                ],
            },
        ]
    );
}

#[tokio::test]
async fn prior_turns_are_replayed_into_the_prompt() {
    let completer = Arc::new(ScriptedCompleter::new());
    completer.push_reply("first answer");
    completer.push_reply("second answer");
    let mut orchestrator = orchestrator(projects_embedder(), completer.clone(), QaConfig::default());
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("Tell me about churn", &mut surface).await.unwrap();
    let turn = orchestrator.ask("What were its metrics?", &mut surface).await.unwrap();
    assert_eq!(turn.order, 1);

    let prompts = completer.prompts();
    assert!(!prompts[0].contains("Human: Tell me about churn"));
    assert!(prompts[1].contains("Human: Tell me about churn\nAssistant: first answer"));

    let history = orchestrator.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].question, "Tell me about churn");
    assert_eq!(history[1].answer, "second answer");
}

#[tokio::test]
async fn completion_failure_records_nothing() {
    let completer = Arc::new(ScriptedCompleter::new());
    let mut orchestrator = orchestrator(projects_embedder(), completer.clone(), QaConfig::default());
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("first", &mut surface).await.unwrap();

    completer.set_failing(true);
    let err = orchestrator.ask("second", &mut surface).await.unwrap_err();
    assert!(matches!(err, QaError::CompletionProvider { .. }));
    assert_eq!(orchestrator.history().len(), 1);
    assert_eq!(surface.answers().len(), 1);

    completer.set_failing(false);
    let turn = orchestrator.ask("third", &mut surface).await.unwrap();
    assert_eq!(turn.order, 1);
}

#[tokio::test]
async fn embedding_failure_on_load_keeps_previous_state() {
    let embedder = projects_embedder();
    let completer = Arc::new(ScriptedCompleter::new());
    let mut orchestrator = orchestrator(embedder.clone(), completer, QaConfig::default());
    let mut surface = RecordingSurface::new();

    embedder.set_failing(true);
    let err = orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap_err();
    assert!(matches!(err, QaError::EmbeddingProvider { .. }));
    assert!(matches!(orchestrator.state(), SessionState::Idle));

    embedder.set_failing(false);
    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("alpha?", &mut surface).await.unwrap();

    embedder.set_failing(true);
    assert!(orchestrator.load_document(b"other document").await.is_err());
    let session = orchestrator.session().unwrap();
    assert_eq!(session.index().len(), 3);
    assert_eq!(session.memory().len(), 1);
}

#[tokio::test]
async fn embedding_failure_on_query_records_nothing() {
    let embedder = projects_embedder();
    let mut orchestrator =
        orchestrator(embedder.clone(), Arc::new(ScriptedCompleter::new()), QaConfig::default());
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    embedder.set_failing(true);
    let err = orchestrator.ask("alpha?", &mut surface).await.unwrap_err();
    assert!(matches!(err, QaError::EmbeddingProvider { .. }));
    assert!(orchestrator.history().is_empty());
}

#[tokio::test]
async fn new_document_discards_the_conversation() {
    let completer = Arc::new(ScriptedCompleter::new());
    let mut orchestrator = orchestrator(projects_embedder(), completer.clone(), QaConfig::default());
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("What did we do on churn?", &mut surface).await.unwrap();

    orchestrator.load_document(b"Project Delta: beta testing").await.unwrap();
    let turn = orchestrator.ask("Anything else?", &mut surface).await.unwrap();

    assert_eq!(turn.order, 0);
    assert_eq!(orchestrator.history().len(), 1);
    assert_eq!(orchestrator.session().unwrap().index().len(), 1);
    assert!(!completer.last_prompt().unwrap().contains("What did we do on churn?"));
}

#[tokio::test]
async fn empty_document_retrieves_its_single_empty_section() {
    let mut orchestrator = orchestrator(
        projects_embedder(),
        Arc::new(ScriptedCompleter::new()),
        QaConfig::default(),
    );
    let mut surface = RecordingSurface::new();

    assert_eq!(orchestrator.load_document(b"").await.unwrap(), 1);
    let turn = orchestrator.ask("anything?", &mut surface).await.unwrap();
    assert_eq!(turn.retrieved, vec![Section::new(0, "")]);
}

#[tokio::test]
async fn empty_index_is_reported_without_embedding_the_query() {
    let embedder = projects_embedder();
    let index = KnowledgeIndex::build(Vec::new(), embedder.as_ref()).await.unwrap();
    assert!(index.is_empty());

    let retriever = Retriever::new(embedder.clone());
    let err = retriever.retrieve(&index, "alpha", 5).await.unwrap_err();
    assert!(matches!(err, QaError::EmptyIndex));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn index_build_is_all_or_nothing() {
    let embedder = projects_embedder();
    embedder.set_failing(true);
    let sections = docqa::sectioner::split(PROJECTS, docqa::DEFAULT_DELIMITER);
    let result = KnowledgeIndex::build(sections, embedder.as_ref()).await;
    assert!(matches!(result, Err(QaError::EmbeddingProvider { .. })));
}

#[tokio::test]
async fn equal_scores_keep_document_order() {
    let mut orchestrator = SessionOrchestrator::builder()
        .embedder(Arc::new(ConstantEmbedder))
        .completer(Arc::new(ScriptedCompleter::new()))
        .config(QaConfig::builder().top_k(2).build().unwrap())
        .build()
        .unwrap();
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(b"one##########two##########three").await.unwrap();
    let turn = orchestrator.ask("which?", &mut surface).await.unwrap();
    assert_eq!(texts(&turn.retrieved), vec!["one", "two"]);
}

#[tokio::test]
async fn asking_without_a_document_fails() {
    let mut orchestrator = orchestrator(
        projects_embedder(),
        Arc::new(ScriptedCompleter::new()),
        QaConfig::default(),
    );
    let mut surface = RecordingSurface::new();

    let err = orchestrator.ask("hello?", &mut surface).await.unwrap_err();
    assert!(matches!(err, QaError::NoDocument));
    assert!(surface.rendered.is_empty());
}

#[tokio::test]
async fn run_recovers_from_bad_uploads_and_failed_turns() {
    let completer = Arc::new(ScriptedCompleter::new());
    completer.push_reply("beta answer");
    let mut orchestrator = orchestrator(projects_embedder(), completer, QaConfig::default());
    let mut surface = RecordingSurface::new()
        .with_upload(vec![0xffu8, 0xfe, 0xfd])
        .with_upload(PROJECTS)
        .with_question("beta?");

    orchestrator.run(&mut surface).await.unwrap();

    assert!(orchestrator.is_active());
    assert_eq!(surface.notices().len(), 1);
    assert!(surface.notices()[0].starts_with("Invalid document"));
    assert_eq!(surface.answers(), vec!["beta answer"]);
    assert_eq!(orchestrator.history().len(), 1);
}

#[tokio::test]
async fn run_without_upload_stays_idle() {
    let mut orchestrator = orchestrator(
        projects_embedder(),
        Arc::new(ScriptedCompleter::new()),
        QaConfig::default(),
    );
    let mut surface = RecordingSurface::new().with_question("ignored");

    orchestrator.run(&mut surface).await.unwrap();
    assert!(!orchestrator.is_active());
    assert!(surface.rendered.is_empty());
}

#[tokio::test]
async fn condensed_question_drives_retrieval_but_original_is_recorded() {
    let completer = Arc::new(ScriptedCompleter::new());
    completer.push_reply("churn answer");
    completer.push_reply("What metrics did Project Beta churn prediction report?");
    completer.push_reply("metrics answer");
    let config = QaConfig::builder().top_k(1).condense_questions(true).build().unwrap();
    let mut orchestrator = orchestrator(projects_embedder(), completer.clone(), config);
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("Tell me about churn", &mut surface).await.unwrap();
    assert_eq!(completer.prompts().len(), 1);

    let turn = orchestrator.ask("What were its metrics?", &mut surface).await.unwrap();
    assert_eq!(turn.question, "What were its metrics?");
    assert_eq!(turn.answer, "metrics answer");
    assert_eq!(texts(&turn.retrieved), vec!["Project Beta: churn prediction"]);

    let prompts = completer.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("Follow-up question: What were its metrics?"));
    assert!(prompts[2].contains("Question: What metrics did Project Beta churn prediction report?"));
}

#[tokio::test]
async fn failed_condense_records_nothing() {
    let completer = Arc::new(ScriptedCompleter::new());
    let config = QaConfig::builder().condense_questions(true).build().unwrap();
    let embedder = projects_embedder();
    let mut orchestrator = orchestrator(embedder.clone(), completer.clone(), config);
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    orchestrator.ask("Tell me about churn", &mut surface).await.unwrap();
    let embed_calls = embedder.calls();

    completer.set_failing(true);
    let err = orchestrator.ask("What were its metrics?", &mut surface).await.unwrap_err();
    assert!(matches!(err, QaError::CompletionProvider { .. }));
    assert_eq!(orchestrator.history().len(), 1);
    assert_eq!(surface.answers().len(), 1);
    assert_eq!(embedder.calls(), embed_calls);
}

#[tokio::test]
async fn memory_cap_evicts_oldest_turns() {
    let config = QaConfig::builder().max_turns(Some(2)).build().unwrap();
    let mut orchestrator =
        orchestrator(projects_embedder(), Arc::new(ScriptedCompleter::new()), config);
    let mut surface = RecordingSurface::new();

    orchestrator.load_document(PROJECTS.as_bytes()).await.unwrap();
    for q in ["one", "two", "three"] {
        orchestrator.ask(q, &mut surface).await.unwrap();
    }

    let questions: Vec<&str> = orchestrator.history().iter().map(|t| t.question.as_str()).collect();
    assert_eq!(questions, vec!["two", "three"]);
    assert_eq!(orchestrator.history()[1].order, 2);
}

#[test]
fn builder_requires_providers() {
    let err = SessionOrchestrator::builder().build().unwrap_err();
    assert!(matches!(err, QaError::Config(_)));
}
