//! End-to-end tests for the ask pipeline: SQLite store → adapters →
//! corpus → retrieval gate → response, and the HTTP router on top.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use health_context::ask::{AskRequest, Asker, TemplateAnswerer};
use health_context::config::Config;
use health_context::corpus::CorpusBuilder;
use health_context::db;
use health_context::error::AskError;
use health_context::migrate::apply_schema;
use health_context::models::{ActivityLog, MessageRecord, Source, SymptomLog};
use health_context::retrieval::FirstKRanker;
use health_context::server::{router, AppState};
use health_context::store::{RecordStore, SqliteRecordStore};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// ─── Fixtures ───────────────────────────────────────────────────────

async fn empty_pool() -> SqlitePool {
    let pool = db::connect_in_memory().await.unwrap();
    apply_schema(&pool).await.unwrap();
    pool
}

async fn insert_messages(pool: &SqlitePool, session: &str, n: usize) {
    for i in 0..n {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session)
        .bind(role)
        .bind(format!("message {}", i))
        .bind(1_700_000_000 + i as i64 * 60)
        .execute(pool)
        .await
        .unwrap();
    }
}

async fn insert_symptom(pool: &SqlitePool, session: &str, symptom: &str, ts: i64) {
    sqlx::query(
        "INSERT INTO symptom_logs (session_id, symptom, severity, created_at) VALUES (?, ?, 4, ?)",
    )
    .bind(session)
    .bind(symptom)
    .bind(ts)
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_activity(pool: &SqlitePool, session: &str, activity: &str, ts: i64) {
    sqlx::query(
        "INSERT INTO activity_logs (session_id, activity, duration_minutes, intensity, created_at) \
         VALUES (?, ?, 45, 'moderate', ?)",
    )
    .bind(session)
    .bind(activity)
    .bind(ts)
    .execute(pool)
    .await
    .unwrap();
}

fn asker(config: &Config, pool: &SqlitePool) -> Asker {
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
    Asker::new(config, store).unwrap()
}

/// Store that counts reads and optionally fails all of them.
struct CountingStore {
    reads: AtomicUsize,
    fail: bool,
}

impl CountingStore {
    fn new(fail: bool) -> Self {
        Self {
            reads: AtomicUsize::new(0),
            fail,
        }
    }

    fn touch(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("unable to open database file");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn messages(&self, _: Option<&str>, _: usize) -> Result<Vec<MessageRecord>> {
        self.touch()?;
        Ok(Vec::new())
    }

    async fn symptom_logs(&self, _: Option<&str>, _: usize) -> Result<Vec<SymptomLog>> {
        self.touch()?;
        Ok(Vec::new())
    }

    async fn activity_logs(&self, _: Option<&str>, _: usize) -> Result<Vec<ActivityLog>> {
        self.touch()?;
        Ok(Vec::new())
    }
}

// ─── Orchestrator ───────────────────────────────────────────────────

#[tokio::test]
async fn test_25_messages_two_chunks_at_stub_score() {
    let pool = empty_pool().await;
    insert_messages(&pool, "s1", 25).await;

    let config = Config::minimal();
    let response = asker(&config, &pool)
        .ask(&AskRequest::new("How have I been feeling?").session("s1").k(8))
        .await
        .unwrap();

    assert_eq!(response.top.len(), 2);
    assert_eq!(response.top[0].id, "message-0");
    assert_eq!(response.top[1].id, "message-1");
    assert!(response.top.iter().all(|p| p.score == 0.5));
    assert!(response.top.iter().all(|p| p.source == Source::Message));
    assert!(response.answer.contains("found 2 chunks"));

    // the second window holds messages 20..25
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
    let corpus = CorpusBuilder::new(&config, store)
        .build(Some("s1"))
        .await
        .unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.chunks()[0].content.lines().count(), 20);
    assert_eq!(corpus.chunks()[1].content.lines().count(), 5);
    assert!(corpus.chunks()[1]
        .content
        .starts_with("2023-11-14T22:33:20Z User: message 20"));
}

#[tokio::test]
async fn test_empty_session_returns_empty_top() {
    let pool = empty_pool().await;
    insert_messages(&pool, "someone-else", 3).await;

    let response = asker(&Config::minimal(), &pool)
        .ask(&AskRequest::new("anything?").session("nobody"))
        .await
        .unwrap();

    assert!(response.top.is_empty());
    assert!(response.answer.contains("found 0 chunks"));
}

#[tokio::test]
async fn test_corpus_order_across_sources() {
    let pool = empty_pool().await;
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("diary.md"), "Felt rested today.").unwrap();

    insert_activity(&pool, "s1", "cycling", 300).await;
    insert_symptom(&pool, "s1", "headache", 200).await;
    insert_messages(&pool, "s1", 1).await;

    let mut config = Config::minimal();
    config.notes.dir = Some(tmp.path().to_path_buf());

    let response = asker(&config, &pool)
        .ask(&AskRequest::new("summary").session("s1"))
        .await
        .unwrap();

    let ids: Vec<&str> = response.top.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["message-0", "symptom-0", "activity-0", "note-diary.md-0"]);
    assert_eq!(
        response.top[1].content,
        "1970-01-01T00:03:20Z symptom: headache severity: 4 location: - notes: -"
    );
    assert_eq!(
        response.top[2].content,
        "1970-01-01T00:05:00Z activity: cycling duration: 45 intensity: moderate notes: -"
    );
}

#[tokio::test]
async fn test_k_is_clamped() {
    let pool = empty_pool().await;
    for i in 0..30 {
        insert_symptom(&pool, "s1", &format!("symptom {}", i), i).await;
    }
    let asker = asker(&Config::minimal(), &pool);

    let low = asker
        .ask(&AskRequest::new("q").session("s1").k(0))
        .await
        .unwrap();
    assert_eq!(low.top.len(), 1);

    let high = asker
        .ask(&AskRequest::new("q").session("s1").k(999))
        .await
        .unwrap();
    assert_eq!(high.top.len(), 20);

    let junk = asker
        .ask(&AskRequest::new("q").session("s1").k("lots"))
        .await
        .unwrap();
    assert_eq!(junk.top.len(), 8);
}

#[tokio::test]
async fn test_ask_is_idempotent() {
    let pool = empty_pool().await;
    insert_messages(&pool, "s1", 47).await;
    insert_symptom(&pool, "s1", "fatigue", 10).await;
    let asker = asker(&Config::minimal(), &pool);
    let req = AskRequest::new("q").session("s1").k(5);

    let first = asker.ask(&req).await.unwrap();
    let second = asker.ask(&req).await.unwrap();
    assert_eq!(first.top, second.top);
}

#[tokio::test]
async fn test_global_scope_capped_newest_first() {
    let pool = empty_pool().await;
    insert_symptom(&pool, "a", "old", 1).await;
    insert_symptom(&pool, "b", "newer", 2).await;
    insert_symptom(&pool, "a", "newest", 3).await;

    let mut config = Config::minimal();
    config.corpus.record_cap = 2;
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool));
    let corpus = CorpusBuilder::new(&config, store).build(None).await.unwrap();

    let contents: Vec<&str> = corpus.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents.len(), 2);
    assert!(contents[0].contains("newest"));
    assert!(contents[1].contains("newer"));
}

#[tokio::test]
async fn test_empty_question_never_touches_store() {
    let store = Arc::new(CountingStore::new(false));
    let asker = Asker::new(&Config::minimal(), store.clone()).unwrap();

    let err = asker.ask(&AskRequest::new("")).await.unwrap_err();
    assert!(matches!(err, AskError::InvalidInput(_)));
    assert_eq!(store.reads.load(Ordering::SeqCst), 0);

    asker.ask(&AskRequest::new("ok")).await.unwrap();
    assert_eq!(store.reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_store_down_with_notes_degrades() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("n.txt"), "note body").unwrap();
    let mut config = Config::minimal();
    config.notes.dir = Some(tmp.path().to_path_buf());

    let asker = Asker::new(&config, Arc::new(CountingStore::new(true))).unwrap();
    let response = asker.ask(&AskRequest::new("q")).await.unwrap();
    assert_eq!(response.top.len(), 1);
    assert_eq!(response.top[0].source, Source::Note);
}

#[tokio::test]
async fn test_store_down_without_notes_is_build_failure() {
    let asker = Asker::new(&Config::minimal(), Arc::new(CountingStore::new(true))).unwrap();
    let err = asker.ask(&AskRequest::new("q")).await.unwrap_err();
    match err {
        AskError::BuildFailure(msg) => assert!(msg.contains("unable to open database file")),
        other => panic!("expected BuildFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mistyped_symptom_row_degrades_to_other_sources() {
    let pool = empty_pool().await;
    insert_messages(&pool, "s1", 1).await;
    insert_activity(&pool, "s1", "walking", 400).await;
    sqlx::query(
        "INSERT INTO symptom_logs (session_id, symptom, severity, created_at) \
         VALUES ('s1', 'headache', 'high', 300)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let response = asker(&Config::minimal(), &pool)
        .ask(&AskRequest::new("what happened?").session("s1"))
        .await
        .unwrap();

    let ids: Vec<&str> = response.top.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["message-0", "activity-0"]);
}

// ─── HTTP ───────────────────────────────────────────────────────────

async fn post_ask(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ask")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_ask_shape() {
    let pool = empty_pool().await;
    insert_messages(&pool, "s1", 25).await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let (status, body) = post_ask(
        app,
        json!({
            "question": "how am I doing?",
            "sessionId": "s1",
            "k": 8,
            "attachments": [{"url": "https://files.local/labs.pdf", "name": "labs.pdf"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].is_string());
    let top = body["top"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["id"], "message-0");
    assert_eq!(top[0]["source"], "message");
    assert_eq!(top[0]["score"], 0.5);
    // 20 lines of ~40 chars get cut for display
    let preview = top[0]["content"].as_str().unwrap();
    assert_eq!(preview.chars().count(), 201);
    assert!(preview.ends_with('…'));
}

#[tokio::test]
async fn test_http_empty_question_is_400() {
    let pool = empty_pool().await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let (status, body) = post_ask(app, json!({ "question": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_http_malformed_attachment_is_400() {
    let pool = empty_pool().await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let (status, body) = post_ask(
        app,
        json!({ "question": "q", "attachments": [{ "name": "no url" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

async fn post_raw(
    app: axum::Router,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method("POST").uri("/ask");
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    let response = app
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_unparseable_body_is_400_json() {
    let pool = empty_pool().await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let (status, body) = post_raw(app, Some("application/json"), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_http_missing_content_type_is_400_json() {
    let pool = empty_pool().await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let (status, body) = post_raw(app, None, r#"{"question":"q"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_http_build_failure_is_500() {
    let config = Config::minimal();
    let asker = Asker::with_parts(
        CorpusBuilder::new(&config, Arc::new(CountingStore::new(true))),
        Box::new(FirstKRanker::default()),
        Box::new(TemplateAnswerer),
        &config.retrieval,
    );
    let app = router(AppState::new(asker));

    let (status, body) = post_ask(app, json!({ "question": "q" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "failed");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unable to open database file"));
}

#[tokio::test]
async fn test_http_health() {
    let pool = empty_pool().await;
    let app = router(AppState::new(asker(&Config::minimal(), &pool)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}
