use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SourceUnavailable;
use crate::models::{format_ts, ActivityLog, Chunk, Source};
use crate::source_symptoms::ABSENT;
use crate::sources::SourceAdapter;
use crate::store::RecordStore;

/// Activity log adapter. One record, one chunk.
pub struct ActivityAdapter {
    store: Arc<dyn RecordStore>,
    cap: usize,
}

impl ActivityAdapter {
    pub fn new(store: Arc<dyn RecordStore>, cap: usize) -> Self {
        Self { store, cap }
    }
}

pub fn format_activity(log: &ActivityLog) -> String {
    format!(
        "{} activity: {} duration: {} intensity: {} notes: {}",
        format_ts(log.created_at),
        log.activity,
        log.duration_minutes
            .map(|d| d.to_string())
            .unwrap_or_else(|| ABSENT.to_string()),
        log.intensity.as_deref().unwrap_or(ABSENT),
        log.notes.as_deref().unwrap_or(ABSENT),
    )
}

#[async_trait]
impl SourceAdapter for ActivityAdapter {
    fn source(&self) -> Source {
        Source::Activity
    }

    async fn collect(&self, session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable> {
        let logs = self
            .store
            .activity_logs(session, self.cap)
            .await
            .map_err(|e| SourceUnavailable::new(Source::Activity, e))?;

        Ok(logs
            .iter()
            .enumerate()
            .map(|(i, log)| Chunk::ordinal(Source::Activity, i, format_activity(log)))
            .collect())
    }
}
