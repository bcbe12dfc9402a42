//! Source adapter contract and the fail-soft policy.
//!
//! Every record category is read by one [`SourceAdapter`]. Adapters report
//! read failures as [`SourceUnavailable`]; [`collect_soft`] is the single
//! place where such a failure, or a timeout, is downgraded to an empty
//! chunk list so one broken source never takes down the whole corpus.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::error::SourceUnavailable;
use crate::models::{Chunk, Source};
use crate::source_activity::ActivityAdapter;
use crate::source_documents::DocumentAdapter;
use crate::source_messages::MessageAdapter;
use crate::source_notes::NotesAdapter;
use crate::source_symptoms::SymptomAdapter;
use crate::store::{RecordStore, SqliteRecordStore};

/// Reads one category of record and renders it into chunks.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Chunks for `session`, or for the most recent records across all
    /// sessions when `None`. Ordered as they should appear in the corpus.
    async fn collect(&self, session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable>;

    /// Whether this adapter reads from an external collaborator (database
    /// or filesystem). Adapters that don't cannot be "unavailable".
    fn has_backing(&self) -> bool {
        true
    }
}

/// Outcome of one adapter call after the fail-soft policy.
#[derive(Debug)]
pub struct Collected {
    pub source: Source,
    pub chunks: Vec<Chunk>,
    /// Set when the adapter failed or timed out and `chunks` is a substitute.
    pub unavailable: Option<SourceUnavailable>,
}

/// Run an adapter, bounded by `timeout`, replacing any failure with an
/// empty list.
pub async fn collect_soft(
    adapter: &dyn SourceAdapter,
    session: Option<&str>,
    timeout: Duration,
) -> Collected {
    let source = adapter.source();
    let outcome = match tokio::time::timeout(timeout, adapter.collect(session)).await {
        Ok(result) => result,
        Err(_) => Err(SourceUnavailable::new(
            source,
            format!("timed out after {:?}", timeout),
        )),
    };

    match outcome {
        Ok(chunks) => Collected {
            source,
            chunks,
            unavailable: None,
        },
        Err(err) => {
            tracing::warn!(
                source = %source,
                error = %err.message,
                "source unavailable, continuing without it"
            );
            Collected {
                source,
                chunks: Vec::new(),
                unavailable: Some(err),
            }
        }
    }
}

/// Build the adapter for `source`. Adding a [`Source`] variant fails to
/// compile until it is handled here.
pub fn adapter_for(
    source: Source,
    config: &Config,
    store: Arc<dyn RecordStore>,
) -> Box<dyn SourceAdapter> {
    let corpus = &config.corpus;
    match source {
        Source::Message => Box::new(MessageAdapter::new(
            store,
            corpus.message_window,
            corpus.record_cap,
        )),
        Source::Symptom => Box::new(SymptomAdapter::new(store, corpus.record_cap)),
        Source::Activity => Box::new(ActivityAdapter::new(store, corpus.record_cap)),
        Source::Document => Box::new(DocumentAdapter::new(config.documents.dir.clone())),
        Source::Note => Box::new(NotesAdapter::new(
            config.notes.dir.clone(),
            config.notes.include_globs.clone(),
            corpus.note_window_chars,
        )),
    }
}

/// All adapters in corpus order.
pub fn default_adapters(
    config: &Config,
    store: Arc<dyn RecordStore>,
) -> Vec<Box<dyn SourceAdapter>> {
    Source::ALL
        .iter()
        .map(|&source| adapter_for(source, config, store.clone()))
        .collect()
}

/// Print every source with its configuration and reachability.
pub async fn list_sources(config: &Config, store: &SqliteRecordStore) -> Result<()> {
    let db_ok = store.ping().await;

    println!("{:<10} {:<40} HEALTHY", "SOURCE", "BACKING");
    for source in Source::ALL {
        let (backing, healthy) = match source {
            Source::Message | Source::Symptom | Source::Activity => {
                (config.db.path.display().to_string(), db_ok)
            }
            Source::Note => match &config.notes.dir {
                Some(dir) => (dir.display().to_string(), dir.is_dir()),
                None => ("NOT CONFIGURED".to_string(), false),
            },
            Source::Document => ("DISABLED".to_string(), false),
        };
        println!("{:<10} {:<40} {}", source, backing, healthy);
    }

    Ok(())
}
