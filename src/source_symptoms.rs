//! Symptom log adapter. One record, one chunk.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SourceUnavailable;
use crate::models::{format_ts, Chunk, Source, SymptomLog};
use crate::sources::SourceAdapter;
use crate::store::RecordStore;

/// Placeholder for an absent optional field.
pub const ABSENT: &str = "-";

pub struct SymptomAdapter {
    store: Arc<dyn RecordStore>,
    cap: usize,
}

impl SymptomAdapter {
    pub fn new(store: Arc<dyn RecordStore>, cap: usize) -> Self {
        Self { store, cap }
    }
}

pub fn format_symptom(log: &SymptomLog) -> String {
    format!(
        "{} symptom: {} severity: {} location: {} notes: {}",
        format_ts(log.created_at),
        log.symptom,
        log.severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| ABSENT.to_string()),
        log.location.as_deref().unwrap_or(ABSENT),
        log.notes.as_deref().unwrap_or(ABSENT),
    )
}

#[async_trait]
impl SourceAdapter for SymptomAdapter {
    fn source(&self) -> Source {
        Source::Symptom
    }

    async fn collect(&self, session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable> {
        let logs = self
            .store
            .symptom_logs(session, self.cap)
            .await
            .map_err(|e| SourceUnavailable::new(Source::Symptom, e))?;

        Ok(logs
            .iter()
            .enumerate()
            .map(|(i, log)| Chunk::ordinal(Source::Symptom, i, format_symptom(log)))
            .collect())
    }
}
