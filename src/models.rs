//! Core data models used throughout Health Context.
//!
//! Records come out of the store, get rendered by a source adapter into
//! [`Chunk`]s, and leave the retrieval gate as [`RetrievalResult`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Where a chunk came from. Variant order is corpus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Message,
    Symptom,
    Activity,
    Document,
    Note,
}

impl Source {
    /// All sources, in the order the aggregator visits them.
    pub const ALL: [Source; 5] = [
        Source::Message,
        Source::Symptom,
        Source::Activity,
        Source::Document,
        Source::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Message => "message",
            Source::Symptom => "symptom",
            Source::Activity => "activity",
            Source::Document => "document",
            Source::Note => "note",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single retrievable unit of normalized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Unique within one corpus build.
    pub id: String,
    pub source: Source,
    /// Never empty.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Chunk {
    /// Chunk with an ordinal id, e.g. `symptom-3`.
    pub fn ordinal(source: Source, ordinal: usize, content: String) -> Self {
        Self {
            id: format!("{}-{}", source, ordinal),
            source,
            content,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Anything other than `user` was produced by the assistant.
    pub fn from_db(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One chat turn.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct SymptomLog {
    pub session_id: String,
    pub symptom: String,
    pub severity: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub session_id: String,
    pub activity: String,
    pub duration_minutes: Option<i64>,
    pub intensity: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// A chunk selected by the retrieval gate.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub id: String,
    pub source: Source,
    pub content: String,
    /// Relevance in `[0.0, 1.0]`.
    pub score: f64,
}

/// File reference sent alongside a question. Accepted, not yet consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Render a unix timestamp the way every chunk line starts.
pub fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
