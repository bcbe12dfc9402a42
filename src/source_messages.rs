//! Chat transcript adapter.
//!
//! Each turn becomes one line, `"{timestamp} {User|Assistant}: {content}"`,
//! and every `window` consecutive lines become one chunk. Window boundaries
//! are positional only; a chunk may start mid-conversation.

use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::Arc;

use crate::error::SourceUnavailable;
use crate::models::{format_ts, Chunk, MessageRecord, Source};
use crate::sources::SourceAdapter;
use crate::store::RecordStore;
use crate::window::count_windows;

pub struct MessageAdapter {
    store: Arc<dyn RecordStore>,
    window: usize,
    cap: usize,
}

impl MessageAdapter {
    pub fn new(store: Arc<dyn RecordStore>, window: usize, cap: usize) -> Self {
        Self { store, window, cap }
    }
}

pub fn format_line(msg: &MessageRecord) -> String {
    format!(
        "{} {}: {}",
        format_ts(msg.created_at),
        msg.role.label(),
        msg.content
    )
}

/// Window formatted transcript lines into message chunks.
pub fn message_chunks(lines: &[String], window: usize) -> Vec<Chunk> {
    count_windows(lines, window)
        .into_iter()
        .enumerate()
        .map(|(i, content)| {
            let line_count = window.min(lines.len() - i * window);
            let mut metadata = Map::new();
            metadata.insert("lines".to_string(), json!(line_count));
            Chunk::ordinal(Source::Message, i, content).with_metadata(metadata)
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for MessageAdapter {
    fn source(&self) -> Source {
        Source::Message
    }

    async fn collect(&self, session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable> {
        let messages = self
            .store
            .messages(session, self.cap)
            .await
            .map_err(|e| SourceUnavailable::new(Source::Message, e))?;

        let lines: Vec<String> = messages.iter().map(format_line).collect();
        Ok(message_chunks(&lines, self.window))
    }
}
