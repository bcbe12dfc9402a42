//! Chunk aggregation.
//!
//! [`CorpusBuilder::build`] runs every source adapter in corpus order
//! (message, symptom, activity, document, note) and concatenates their
//! output unchanged. There is no deduplication, merging or reordering.
//!
//! A failing adapter contributes nothing and the build carries on. Only
//! when every adapter that reads from a database or directory is
//! unavailable does the build itself fail.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db;
use crate::error::AskError;
use crate::models::{Chunk, Source};
use crate::sources::{collect_soft, default_adapters, SourceAdapter};
use crate::store::{RecordStore, SqliteRecordStore};

/// Ordered chunks produced by one build.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn count_by_source(&self, source: Source) -> usize {
        self.chunks.iter().filter(|c| c.source == source).count()
    }

    /// Returns the first id that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.chunks
            .iter()
            .map(|c| c.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl From<Vec<Chunk>> for Corpus {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }
}

pub struct CorpusBuilder {
    adapters: Vec<Box<dyn SourceAdapter>>,
    timeout: Duration,
}

impl CorpusBuilder {
    /// Builder with the standard adapter set.
    pub fn new(config: &Config, store: Arc<dyn RecordStore>) -> Self {
        Self {
            adapters: default_adapters(config, store),
            timeout: config.corpus.adapter_timeout(),
        }
    }

    /// Builder over an explicit adapter list, visited in the given order.
    pub fn with_adapters(adapters: Vec<Box<dyn SourceAdapter>>, timeout: Duration) -> Self {
        Self { adapters, timeout }
    }

    pub async fn build(&self, session: Option<&str>) -> Result<Corpus, AskError> {
        let mut chunks = Vec::new();
        let mut failures = Vec::new();
        let mut backed = 0usize;

        for adapter in &self.adapters {
            let collected = collect_soft(adapter.as_ref(), session, self.timeout).await;
            tracing::debug!(
                source = %collected.source,
                chunks = collected.chunks.len(),
                "source collected"
            );
            if adapter.has_backing() {
                backed += 1;
                if let Some(err) = collected.unavailable {
                    failures.push(err.to_string());
                }
            }
            chunks.extend(collected.chunks);
        }

        if backed > 0 && failures.len() == backed {
            return Err(AskError::BuildFailure(failures.join("; ")));
        }

        let corpus = Corpus::from(chunks);
        debug_assert!(corpus.duplicate_id().is_none());
        tracing::info!(
            session = session.unwrap_or("*"),
            chunks = corpus.len(),
            degraded_sources = failures.len(),
            "corpus built"
        );
        Ok(corpus)
    }
}

/// `hctx corpus`: build and print the corpus as JSON.
pub async fn run_corpus(config: &Config, session: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
    let corpus = CorpusBuilder::new(config, store)
        .build(session.as_deref())
        .await?;

    println!("{}", serde_json::to_string_pretty(&corpus)?);

    pool.close().await;
    Ok(())
}
