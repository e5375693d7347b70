use super::*;
use crate::RagError;
use crate::embeddings::EmbeddingError;
use crate::llm::LlmError;
use crate::store::ChunkMetadata;
use crate::web::{WebHit, WebSearchError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const DIM: usize = 2;

/// Returns the same vector for every text
struct FixedEmbedder(Vec<f32>);

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.0.len()
    }
}

struct DownEmbedder;

#[async_trait]
impl Embedder for DownEmbedder {
    async fn embed(&self, _texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("model not loaded".to_string()))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

struct ScriptedSearch {
    result: std::result::Result<Vec<WebHit>, ()>,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
}

impl ScriptedSearch {
    fn returning(hits: Vec<WebHit>) -> Self {
        Self {
            result: Ok(hits),
            calls: AtomicUsize::new(0),
            last_limit: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(()),
            calls: AtomicUsize::new(0),
            last_limit: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WebSearch for ScriptedSearch {
    async fn search(
        &self,
        _query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<WebHit>, WebSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(|()| WebSearchError::Request("HTTP 503".to_string()))
    }
}

struct RecordingModel {
    reply: std::result::Result<String, ()>,
    calls: Mutex<Vec<(String, u32, f32)>>,
}

impl RecordingModel {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, LlmError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((prompt.to_string(), max_tokens, temperature));
        self.reply
            .clone()
            .map_err(|()| LlmError::Request("HTTP 429".to_string()))
    }
}

fn hit(title: &str) -> WebHit {
    WebHit {
        title: title.to_string(),
        snippet: format!("about {}", title),
        link: format!("https://example.com/{}", title),
    }
}

fn store_with(dir: &TempDir, entries: &[(&str, [f32; DIM])]) -> VectorStore {
    let mut store = VectorStore::open(dir.path(), DIM).expect("Failed to open store");
    let vectors = entries.iter().map(|(_, v)| v.to_vec()).collect();
    let metadata = entries
        .iter()
        .enumerate()
        .map(|(i, (text, _))| ChunkMetadata::new("notes.txt", "d1", i, *text))
        .collect();
    store.add(vectors, metadata).expect("Failed to add entries");
    store
}

fn three_entry_store(dir: &TempDir) -> VectorStore {
    store_with(
        dir,
        &[("far", [5.0, 5.0]), ("near", [1.0, 0.0]), ("mid", [2.0, 2.0])],
    )
}

#[tokio::test]
async fn retrieves_nearest_chunks_without_web() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let search = Arc::new(ScriptedSearch::returning(vec![hit("a")]));
    let web = Arc::clone(&search);
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(RecordingModel::replying("summary")),
    )
    .with_web_search(web, 4);

    let context = retriever
        .answer_context("where?", &store, 2, false)
        .await
        .expect("retrieval should succeed");

    let texts: Vec<&str> = context
        .retrieved
        .iter()
        .map(|r| r.chunk_metadata.text.as_str())
        .collect();
    assert_eq!(texts, vec!["near", "mid"]);
    assert!(context.retrieved[0].distance.abs() < f32::EPSILON);
    assert!(context.web_summary.is_empty());
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn k_larger_than_store_returns_everything() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![0.0, 0.0])),
        Arc::new(RecordingModel::replying("unused")),
    );

    let context = retriever
        .answer_context("all", &store, 10, false)
        .await
        .expect("retrieval should succeed");

    assert_eq!(context.retrieved.len(), 3);
}

#[tokio::test]
async fn empty_store_retrieves_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = VectorStore::open(temp_dir.path(), DIM).expect("Failed to open store");
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![0.0, 0.0])),
        Arc::new(RecordingModel::replying("unused")),
    );

    let context = retriever
        .answer_context("anything", &store, 4, false)
        .await
        .expect("retrieval should succeed");

    assert_eq!(context, AnswerContext::default());
}

#[tokio::test]
async fn web_hits_are_summarized() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let search = Arc::new(ScriptedSearch::returning(vec![hit("a"), hit("b")]));
    let web = Arc::clone(&search);
    let model = Arc::new(RecordingModel::replying("Both pages agree."));
    let llm = Arc::clone(&model);
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), llm)
        .with_web_search(web, 3);

    let context = retriever
        .answer_context("news", &store, 1, true)
        .await
        .expect("retrieval should succeed");

    assert_eq!(context.retrieved.len(), 1);
    assert_eq!(context.web_summary, "Both pages agree.");
    assert_eq!(search.last_limit.load(Ordering::SeqCst), 3);

    let calls = model.calls.lock().expect("lock poisoned");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains("- a → about a\n- b → about b\n"));
    assert_eq!(calls[0].1, 200);
}

#[tokio::test]
async fn web_failure_leaves_empty_summary() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let model = Arc::new(RecordingModel::replying("unused"));
    let llm = Arc::clone(&model);
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), llm)
        .with_web_search(Arc::new(ScriptedSearch::failing()), 4);

    let context = retriever
        .answer_context("news", &store, 2, true)
        .await
        .expect("web failure is not fatal");

    assert_eq!(context.retrieved.len(), 2);
    assert!(context.web_summary.is_empty());
    assert!(model.calls.lock().expect("lock poisoned").is_empty());
}

#[tokio::test]
async fn summary_failure_leaves_empty_summary() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(RecordingModel::failing()),
    )
    .with_web_search(Arc::new(ScriptedSearch::returning(vec![hit("a")])), 4);

    let context = retriever
        .answer_context("news", &store, 2, true)
        .await
        .expect("summary failure is not fatal");

    assert!(context.web_summary.is_empty());
}

#[tokio::test]
async fn no_hits_skip_summary() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let model = Arc::new(RecordingModel::replying("unused"));
    let llm = Arc::clone(&model);
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), llm)
        .with_web_search(Arc::new(ScriptedSearch::returning(Vec::new())), 4);

    let context = retriever
        .answer_context("obscure", &store, 2, true)
        .await
        .expect("retrieval should succeed");

    assert!(context.web_summary.is_empty());
    assert!(model.calls.lock().expect("lock poisoned").is_empty());
}

#[tokio::test]
async fn web_requested_without_provider_is_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        Arc::new(RecordingModel::replying("unused")),
    );

    let context = retriever
        .answer_context("news", &store, 2, true)
        .await
        .expect("retrieval should succeed");

    assert!(context.web_summary.is_empty());
}

#[tokio::test]
async fn embedding_failure_still_returns_web_summary() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let retriever = Retriever::new(
        Arc::new(DownEmbedder),
        Arc::new(RecordingModel::replying("From the web.")),
    )
    .with_web_search(Arc::new(ScriptedSearch::returning(vec![hit("a")])), 4);

    let context = retriever
        .answer_context("news", &store, 2, true)
        .await
        .expect("embedding failure is not fatal");

    assert!(context.retrieved.is_empty());
    assert_eq!(context.web_summary, "From the web.");
}

#[tokio::test]
async fn query_dimension_mismatch_propagates() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = three_entry_store(&temp_dir);
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0])),
        Arc::new(RecordingModel::replying("unused")),
    );

    let result = retriever.answer_context("where?", &store, 2, false).await;

    assert!(matches!(
        result,
        Err(RagError::Store(StoreError::DimensionMismatch {
            expected: 2,
            actual: 3
        }))
    ));
}

#[tokio::test]
async fn answer_uses_prompt_and_token_limit() {
    let model = Arc::new(RecordingModel::replying("Friday."));
    let llm = Arc::clone(&model);
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![0.0, 0.0])), llm);
    let context = AnswerContext {
        retrieved: Vec::new(),
        web_summary: "Launch moved to Friday.".to_string(),
    };

    let reply = retriever
        .answer("When is the launch?", ResponseMode::Concise, &context, 0.7)
        .await
        .expect("answer should succeed");

    assert_eq!(reply, "Friday.");
    let calls = model.calls.lock().expect("lock poisoned");
    assert_eq!(
        calls[0].0,
        build_answer_prompt("When is the launch?", ResponseMode::Concise, &context)
    );
    assert_eq!(calls[0].1, ANSWER_MAX_TOKENS);
    assert!((calls[0].2 - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn answer_uses_configured_token_limit() {
    let model = Arc::new(RecordingModel::replying("Short."));
    let llm = Arc::clone(&model);
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![0.0, 0.0])), llm)
        .with_answer_max_tokens(1024);

    retriever
        .answer("q", ResponseMode::Concise, &AnswerContext::default(), 0.2)
        .await
        .expect("answer should succeed");

    let calls = model.calls.lock().expect("lock poisoned");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, 1024);
}

#[tokio::test]
async fn answer_propagates_model_errors() {
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder(vec![0.0, 0.0])),
        Arc::new(RecordingModel::failing()),
    );

    let result = retriever
        .answer("q", ResponseMode::Detailed, &AnswerContext::default(), 0.2)
        .await;

    assert!(matches!(result, Err(RagError::Llm(_))));
}
