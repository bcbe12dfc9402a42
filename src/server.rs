//! HTTP server.
//!
//! Exposes the question-answering pipeline as a JSON API for the mobile web
//! client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Build the corpus for a session and return the top chunks |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Request
//!
//! ```json
//! { "question": "How did I sleep?", "sessionId": "abc", "k": 5,
//!   "attachments": [{ "url": "https://…/labs.pdf", "name": "labs.pdf", "type": "application/pdf" }] }
//! ```
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid input: question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `failed` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the web client can be
//! served from a different origin during development.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ask::{AskRequest, AskResponse, Asker};
use crate::config::Config;
use crate::db;
use crate::error::AskError;
use crate::retrieval::Ranker;
use crate::store::{RecordStore, SqliteRecordStore};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    asker: Arc<Asker>,
}

impl AppState {
    pub fn new(asker: Asker) -> Self {
        Self {
            asker: Arc::new(asker),
        }
    }
}

/// Starts the HTTP server with the configured ranker.
///
/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool));
    let asker = Asker::new(config, store)?;
    serve(config, asker).await
}

/// Starts the server with a caller-supplied [`Ranker`] in place of the
/// configured one. This is the seam for real relevance scoring.
pub async fn run_server_with_ranker(
    config: &Config,
    store: Arc<dyn RecordStore>,
    ranker: Box<dyn Ranker>,
) -> anyhow::Result<()> {
    let asker = Asker::with_parts(
        crate::corpus::CorpusBuilder::new(config, store),
        ranker,
        Box::new(crate::ask::TemplateAnswerer),
        &config.retrieval,
    );
    serve(config, asker).await
}

async fn serve(config: &Config, asker: Asker) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let ranker = asker.ranker_name().to_string();
    let app = router(AppState::new(asker));

    tracing::info!(bind = %bind_addr, ranker = %ranker, "server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Exposed so tests can drive it without a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"bad_request"` or `"failed"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "failed".to_string(),
        message: message.into(),
    }
}

impl From<AskError> for AppError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::InvalidInput(_) => bad_request(err.to_string()),
            AskError::BuildFailure(_) => {
                tracing::error!(error = %err, "ask failed");
                failed(err.to_string())
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

/// Handler for `POST /ask`.
///
/// The body is taken as raw JSON and converted here so malformed fields
/// (e.g. an attachment without `url`), unparseable bodies and a missing
/// `content-type` all map to `400 bad_request` instead of Axum's default
/// plain-text rejection.
async fn handle_ask(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(body) = body.map_err(|e| bad_request(format!("invalid input: {}", e.body_text())))?;
    let req: AskRequest =
        serde_json::from_value(body).map_err(|e| bad_request(format!("invalid input: {}", e)))?;

    let response = state.asker.ask(&req).await?;
    Ok(Json(response))
}
