//! Question answering over a freshly built corpus.
//!
//! [`Asker::ask`] is the entry point used by both `hctx ask` and
//! `POST /ask`. Each call validates the request, rebuilds the corpus for the
//! session, runs the retrieval gate and renders an answer. Nothing is
//! cached between calls and nothing is written.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, RetrievalConfig};
use crate::corpus::{Corpus, CorpusBuilder};
use crate::db;
use crate::error::AskError;
use crate::models::{Attachment, RetrievalResult, Source};
use crate::retrieval::{create_ranker, retrieve, Ranker};
use crate::store::{RecordStore, SqliteRecordStore};

/// Characters of chunk content shown in a preview.
pub const PREVIEW_CHARS: usize = 200;

/// Request body for `POST /ask`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub question: Value,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Any JSON value; non-numeric values fall back to the default.
    #[serde(default)]
    pub k: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: Value::String(question.into()),
            ..Self::default()
        }
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn k(mut self, k: impl Into<Value>) -> Self {
        self.k = Some(k.into());
        self
    }
}

/// A retrieval result trimmed for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkPreview {
    pub id: String,
    pub source: Source,
    pub content: String,
    pub score: f64,
}

impl From<RetrievalResult> for ChunkPreview {
    fn from(r: RetrievalResult) -> Self {
        Self {
            id: r.id,
            source: r.source,
            content: preview(&r.content),
            score: r.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub top: Vec<ChunkPreview>,
}

/// Produces the `answer` text from the corpus and the selected chunks.
pub trait Answerer: Send + Sync {
    fn answer(&self, question: &str, corpus: &Corpus, top: &[RetrievalResult]) -> String;
}

/// Fixed sentence reporting corpus size; no generation.
#[derive(Debug, Clone, Default)]
pub struct TemplateAnswerer;

impl Answerer for TemplateAnswerer {
    fn answer(&self, _question: &str, corpus: &Corpus, top: &[RetrievalResult]) -> String {
        format!(
            "I found {} chunks across your health records and selected the top {}. \
             Generative analysis is disabled, so review the excerpts below directly.",
            corpus.len(),
            top.len()
        )
    }
}

pub struct Asker {
    builder: CorpusBuilder,
    ranker: Box<dyn Ranker>,
    answerer: Box<dyn Answerer>,
    default_k: usize,
    max_k: usize,
}

impl Asker {
    pub fn new(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self> {
        Ok(Self::with_parts(
            CorpusBuilder::new(config, store),
            create_ranker(&config.retrieval)?,
            Box::new(TemplateAnswerer),
            &config.retrieval,
        ))
    }

    pub fn with_parts(
        builder: CorpusBuilder,
        ranker: Box<dyn Ranker>,
        answerer: Box<dyn Answerer>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            builder,
            ranker,
            answerer,
            default_k: retrieval.default_k,
            max_k: retrieval.max_k,
        }
    }

    pub fn ranker_name(&self) -> &str {
        self.ranker.name()
    }

    pub async fn ask(&self, req: &AskRequest) -> Result<AskResponse, AskError> {
        let question = validate_question(&req.question)?;
        if let Some(attachments) = &req.attachments {
            validate_attachments(attachments)?;
        }
        let k = resolve_k(req.k.as_ref(), self.default_k, self.max_k);
        let session = req
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let corpus = self.builder.build(session).await?;
        let top = retrieve(self.ranker.as_ref(), question, &corpus, k);
        let answer = self.answerer.answer(question, &corpus, &top);

        tracing::info!(
            corpus = corpus.len(),
            k,
            returned = top.len(),
            ranker = self.ranker.name(),
            "ask served"
        );

        Ok(AskResponse {
            answer,
            top: top.into_iter().map(ChunkPreview::from).collect(),
        })
    }
}

fn validate_question(question: &Value) -> Result<&str, AskError> {
    match question {
        Value::String(s) if !s.trim().is_empty() => Ok(s.as_str()),
        Value::String(_) => Err(AskError::InvalidInput(
            "question must not be empty".to_string(),
        )),
        Value::Null => Err(AskError::InvalidInput("question is required".to_string())),
        _ => Err(AskError::InvalidInput(
            "question must be a string".to_string(),
        )),
    }
}

fn validate_attachments(attachments: &[Attachment]) -> Result<(), AskError> {
    for (i, a) in attachments.iter().enumerate() {
        if a.url.trim().is_empty() {
            return Err(AskError::InvalidInput(format!(
                "attachments[{}].url must not be empty",
                i
            )));
        }
    }
    Ok(())
}

/// Interpret a caller-supplied `k`. Numbers and numeric strings are
/// floored and clamped to `[1, max_k]`; anything else yields `default_k`.
pub fn resolve_k(k: Option<&Value>, default_k: usize, max_k: usize) -> usize {
    let parsed = match k {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => {
            let floored = v.floor();
            if floored < 1.0 {
                1
            } else if floored >= max_k as f64 {
                max_k
            } else {
                floored as usize
            }
        }
        _ => default_k,
    }
}

/// First [`PREVIEW_CHARS`] characters, with an ellipsis when cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &content[..cut]),
        None => content.to_string(),
    }
}

/// `hctx ask`: answer one question and print the response as JSON.
pub async fn run_ask(
    config: &Config,
    question: &str,
    session: Option<String>,
    k: Option<i64>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
    let asker = Asker::new(config, store)?;

    let mut req = AskRequest::new(question);
    req.session_id = session;
    req.k = k.map(Value::from);

    let response = asker.ask(&req).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    pool.close().await;
    Ok(())
}
