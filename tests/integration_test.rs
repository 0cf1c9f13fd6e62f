//! Integration tests for the review endpoint.
//!
//! These drive the axum router in-process with fake embedding and
//! completion capabilities, so no model server is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use pr_review_rag::api;
use pr_review_rag::config::Config;
use pr_review_rag::corpus::load_corpus;
use pr_review_rag::llm::{Completer, Embedder, ReviewPrompt};
use pr_review_rag::search::EmbeddingIndex;
use pr_review_rag::state::AppState;

const VOCAB: &[&str] = &["default", "null", "return", "[]"];

/// Embeds text as keyword counts and counts its own invocations.
#[derive(Default)]
struct KeywordEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB
                    .iter()
                    .map(|w| lower.matches(w).count() as f32)
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}

/// Records every prompt and answers with a numbered review.
#[derive(Default)]
struct RecordingCompleter {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Completer for RecordingCompleter {
    async fn complete(&self, prompt: &ReviewPrompt) -> Result<String> {
        let mut prompts = self.prompts.lock();
        prompts.push(prompt.render());
        Ok(format!(
            "Review {}: the default argument is shared across calls.",
            prompts.len()
        ))
    }
}

struct HangingCompleter;

#[async_trait]
impl Completer for HangingCompleter {
    async fn complete(&self, _prompt: &ReviewPrompt) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("never".into())
    }
}

struct BrokenCompleter;

#[async_trait]
impl Completer for BrokenCompleter {
    async fn complete(&self, _prompt: &ReviewPrompt) -> Result<String> {
        anyhow::bail!("Ollama chat API returned 500 Internal Server Error: model crashed")
    }
}

/// Embeds the corpus normally, then never answers a query embedding.
#[derive(Default)]
struct StallingQueryEmbedder {
    inner: KeywordEmbedder,
}

#[async_trait]
impl Embedder for StallingQueryEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.inner.calls.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.embed_batch(texts).await
    }
}

const SCENARIO_CORPUS: &str = "Avoid mutable default arguments.\n\
                               \n\
                               Check for null pointer dereference.\n\
                               Prefer early returns.\n";

fn test_config(timeout_secs: u64) -> Config {
    Config {
        request_timeout_secs: timeout_secs,
        ..Config::default()
    }
}

/// Build state, load the scenario corpus from disk, and publish the index.
async fn ready_state(
    embedder: Arc<KeywordEmbedder>,
    completer: Arc<dyn Completer>,
    timeout_secs: u64,
) -> AppState {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("your_review_data.txt");
    std::fs::write(&path, SCENARIO_CORPUS).unwrap();

    let state = AppState::with_capabilities(&test_config(timeout_secs), embedder, completer);
    let records = load_corpus(&path).unwrap();
    let index = EmbeddingIndex::build(records, state.embedder.clone())
        .await
        .unwrap();
    assert!(state.index.publish(index).is_ok());
    state
}

async fn post_review(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/review")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_scenario_review_with_small_corpus() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let completer = Arc::new(RecordingCompleter::default());
    let state = ready_state(embedder, completer.clone(), 30).await;
    let app = api::router(state);

    let (status, body) = post_review(app, r#"{"diff": "def f(x=[]): return x"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let review = body["review"].as_str().unwrap();
    assert!(!review.is_empty());
    assert!(body.get("error").is_none());

    let prompts = completer.prompts.lock();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Please review the following pull request diff:\ndef f(x=[]): return x"));
    // Corpus is smaller than k, so every record is retrieved
    assert!(prompt.contains("Avoid mutable default arguments."));
    assert!(prompt.contains("Check for null pointer dereference."));
    assert!(prompt.contains("Prefer early returns."));
}

#[tokio::test]
async fn test_empty_object_is_bad_request() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let completer = Arc::new(RecordingCompleter::default());
    let state = ready_state(embedder.clone(), completer.clone(), 30).await;
    let build_calls = embedder.calls.load(Ordering::SeqCst);
    let app = api::router(state);

    let (status, body) = post_review(app, "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "No diff provided" }));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), build_calls);
    assert!(completer.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_empty_and_null_diff_are_bad_request() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let completer = Arc::new(RecordingCompleter::default());
    let state = ready_state(embedder.clone(), completer.clone(), 30).await;
    let build_calls = embedder.calls.load(Ordering::SeqCst);

    for body in [r#"{"diff": ""}"#, r#"{"diff": null}"#] {
        let (status, json) = post_review(api::router(state.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["error"], "No diff provided");
    }

    assert_eq!(embedder.calls.load(Ordering::SeqCst), build_calls);
    assert!(completer.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_whitespace_diff_is_reviewed() {
    let completer = Arc::new(RecordingCompleter::default());
    let state = ready_state(Arc::new(KeywordEmbedder::default()), completer.clone(), 30).await;

    for body in [r#"{"diff": "   "}"#, r#"{"diff": "\n"}"#] {
        let (status, json) = post_review(api::router(state.clone()), body).await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert!(json["review"].is_string());
        assert!(json.get("error").is_none());
    }

    let prompts = completer.prompts.lock();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Please review the following pull request diff:\n   \n"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let state = ready_state(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(RecordingCompleter::default()),
        30,
    )
    .await;

    let (status, json) = post_review(api::router(state.clone()), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    let (status, json) = post_review(api::router(state), r#"{"diff": 42}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("review").is_none());
}

#[tokio::test]
async fn test_not_ready_before_index_published() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let completer = Arc::new(RecordingCompleter::default());
    let state = AppState::with_capabilities(&test_config(30), embedder.clone(), completer.clone());

    let (status, body) = post_review(api::router(state), r#"{"diff": "+ x = None"}"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Review index is not ready");
    assert!(body.get("review").is_none());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(completer.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_identical_requests_are_not_cached() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let completer = Arc::new(RecordingCompleter::default());
    let state = ready_state(embedder.clone(), completer.clone(), 30).await;
    let body = r#"{"diff": "- return x\n+ return None"}"#;

    let (s1, b1) = post_review(api::router(state.clone()), body).await;
    let (s2, b2) = post_review(api::router(state), body).await;

    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_ne!(b1["review"], b2["review"]);
    assert_eq!(completer.prompts.lock().len(), 2);
    // one build batch plus one query embedding per request
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_top_k_bounds_retrieved_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guidelines.txt");
    let lines: Vec<String> = (0..10).map(|i| format!("Guideline {i}: return early")).collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let completer = Arc::new(RecordingCompleter::default());
    let state = AppState::with_capabilities(
        &test_config(30),
        Arc::new(KeywordEmbedder::default()),
        completer.clone(),
    );
    let index = EmbeddingIndex::build(load_corpus(&path).unwrap(), state.embedder.clone())
        .await
        .unwrap();
    assert!(state.index.publish(index).is_ok());

    let (status, _) = post_review(api::router(state), r#"{"diff": "+ return 1"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let prompts = completer.prompts.lock();
    let retrieved = prompts[0].matches("Guideline ").count();
    assert_eq!(retrieved, 3);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_timeout_returns_gateway_timeout() {
    let state = ready_state(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(HangingCompleter),
        5,
    )
    .await;

    let (status, body) = post_review(api::router(state), r#"{"diff": "+ x = []"}"#).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    assert!(body.get("review").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_query_embedding_returns_gateway_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("your_review_data.txt");
    std::fs::write(&path, SCENARIO_CORPUS).unwrap();

    let completer = Arc::new(RecordingCompleter::default());
    let state = AppState::with_capabilities(
        &test_config(5),
        Arc::new(StallingQueryEmbedder::default()),
        completer.clone(),
    );
    let index = EmbeddingIndex::build(load_corpus(&path).unwrap(), state.embedder.clone())
        .await
        .unwrap();
    assert!(state.index.publish(index).is_ok());

    let (status, body) = post_review(api::router(state), r#"{"diff": "+ x = []"}"#).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    assert!(body.get("review").is_none());
    assert!(completer.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_returns_bad_gateway() {
    let state = ready_state(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(BrokenCompleter),
        30,
    )
    .await;

    let (status, body) = post_review(api::router(state), r#"{"diff": "+ x = []"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("model crashed"));
    assert!(body.get("review").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = ready_state(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(RecordingCompleter::default()),
        30,
    )
    .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/review")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"diff": "+x"}"#))
        .unwrap();
    let response = api::router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_startup_fails_on_missing_or_blank_corpus() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_corpus(&dir.path().join("your_review_data.txt")).is_err());

    let blank = dir.path().join("blank.txt");
    std::fs::write(&blank, "\n   \n").unwrap();
    let records = load_corpus(&blank).unwrap();
    let result = EmbeddingIndex::build(records, Arc::new(KeywordEmbedder::default())).await;
    assert!(result.is_err());
}
