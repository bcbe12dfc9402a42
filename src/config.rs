//! TOML configuration.
//!
//! Every size and cap used while building a corpus lives here with its
//! default, so deployments can tune them without touching the adapters.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for `k` accepted by the retrieval gate.
pub const MAX_K_CEILING: usize = 20;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Chat lines per message chunk.
    #[serde(default = "default_message_window")]
    pub message_window: usize,
    /// Characters per note chunk.
    #[serde(default = "default_note_window_chars")]
    pub note_window_chars: usize,
    /// Records read per source when no session is given.
    #[serde(default = "default_record_cap")]
    pub record_cap: usize,
    #[serde(default = "default_adapter_timeout_secs")]
    pub adapter_timeout_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            message_window: default_message_window(),
            note_window_chars: default_note_window_chars(),
            record_cap: default_record_cap(),
            adapter_timeout_secs: default_adapter_timeout_secs(),
        }
    }
}

impl CorpusConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

fn default_message_window() -> usize {
    20
}
fn default_note_window_chars() -> usize {
    800
}
fn default_record_cap() -> usize {
    500
}
fn default_adapter_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotesConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_note_globs")]
    pub include_globs: Vec<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            include_globs: default_note_globs(),
        }
    }
}

fn default_note_globs() -> Vec<String> {
    vec!["*.md".to_string(), "*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DocumentsConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_ranker")]
    pub ranker: String,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    /// Score assigned to every result by the `first_k` ranker.
    #[serde(default = "default_stub_score")]
    pub stub_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            ranker: default_ranker(),
            default_k: default_k(),
            max_k: default_max_k(),
            stub_score: default_stub_score(),
        }
    }
}

fn default_ranker() -> String {
    "first_k".to_string()
}
fn default_k() -> usize {
    8
}
fn default_max_k() -> usize {
    MAX_K_CEILING
}
fn default_stub_score() -> f64 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Defaults everywhere, database under `./data`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/health.sqlite"),
            },
            corpus: CorpusConfig::default(),
            notes: NotesConfig::default(),
            documents: DocumentsConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.corpus.message_window == 0 {
            anyhow::bail!("corpus.message_window must be > 0");
        }
        if self.corpus.note_window_chars == 0 {
            anyhow::bail!("corpus.note_window_chars must be > 0");
        }
        if self.corpus.record_cap == 0 {
            anyhow::bail!("corpus.record_cap must be > 0");
        }
        if self.corpus.adapter_timeout_secs == 0 {
            anyhow::bail!("corpus.adapter_timeout_secs must be > 0");
        }

        for pattern in &self.notes.include_globs {
            globset::Glob::new(pattern)
                .with_context(|| format!("notes.include_globs: invalid pattern '{}'", pattern))?;
        }

        let r = &self.retrieval;
        if r.max_k == 0 || r.max_k > MAX_K_CEILING {
            anyhow::bail!("retrieval.max_k must be in [1, {}]", MAX_K_CEILING);
        }
        if r.default_k == 0 || r.default_k > r.max_k {
            anyhow::bail!("retrieval.default_k must be in [1, retrieval.max_k]");
        }
        if !(0.0..=1.0).contains(&r.stub_score) {
            anyhow::bail!("retrieval.stub_score must be in [0.0, 1.0]");
        }
        match r.ranker.as_str() {
            "first_k" => {}
            other => anyhow::bail!("Unknown ranker: '{}'. Must be first_k.", other),
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
