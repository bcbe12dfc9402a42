//! Free-text notes adapter.
//!
//! Scans one directory (not its subdirectories) for files whose names match
//! the include globs, in file-name order, and cuts each into fixed-size
//! character windows. A missing directory is an empty source, not an error.

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{json, Map};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::SourceUnavailable;
use crate::models::{Chunk, Source};
use crate::sources::SourceAdapter;
use crate::window::char_windows;

/// Reads one note file. Swappable so tests can stand in a slow disk.
type ReadNote = fn(&Path) -> std::io::Result<String>;

pub struct NotesAdapter {
    dir: Option<PathBuf>,
    include_globs: Vec<String>,
    window_chars: usize,
    read: ReadNote,
}

impl NotesAdapter {
    pub fn new(dir: Option<PathBuf>, include_globs: Vec<String>, window_chars: usize) -> Self {
        Self {
            dir,
            include_globs,
            window_chars,
            read: |path| std::fs::read_to_string(path),
        }
    }

    #[cfg(test)]
    fn with_reader(mut self, read: ReadNote) -> Self {
        self.read = read;
        self
    }
}

/// Walk and read `dir` synchronously. Runs on the blocking pool so the
/// caller's timeout can fire while the disk is slow.
fn scan(
    dir: &Path,
    include_globs: &[String],
    window_chars: usize,
    read: ReadNote,
) -> Result<Vec<Chunk>, SourceUnavailable> {
    let include_set =
        build_globset(include_globs).map_err(|e| SourceUnavailable::new(Source::Note, e))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SourceUnavailable::new(Source::Note, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if include_set.is_match(&name) {
            files.push((name, entry.into_path()));
        }
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut chunks = Vec::new();
    for (name, path) in files {
        let text = match read(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable note");
                continue;
            }
        };
        chunks.extend(note_chunks(&name, &text, window_chars));
    }

    Ok(chunks)
}

/// Window one note's text into chunks tagged with its file name.
pub fn note_chunks(file_name: &str, text: &str, window_chars: usize) -> Vec<Chunk> {
    char_windows(text, window_chars)
        .into_iter()
        .map(|w| {
            let mut metadata = Map::new();
            metadata.insert("file".to_string(), json!(file_name));
            metadata.insert("offset".to_string(), json!(w.byte_offset));
            Chunk {
                id: format!("{}-{}-{}", Source::Note, file_name, w.byte_offset),
                source: Source::Note,
                content: w.text,
                metadata: Some(metadata),
            }
        })
        .collect()
}

pub fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[async_trait]
impl SourceAdapter for NotesAdapter {
    fn source(&self) -> Source {
        Source::Note
    }

    /// Notes are not session-scoped; `session` is ignored.
    async fn collect(&self, _session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable> {
        match &self.dir {
            Some(dir) if dir.is_dir() => {
                let dir = dir.clone();
                let include_globs = self.include_globs.clone();
                let window_chars = self.window_chars;
                let read = self.read;
                tokio::task::spawn_blocking(move || {
                    scan(&dir, &include_globs, window_chars, read)
                })
                .await
                .map_err(|e| SourceUnavailable::new(Source::Note, e))?
            }
            Some(dir) => {
                tracing::debug!(dir = %dir.display(), "notes directory missing");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// An unset notes directory is not a failing collaborator.
    fn has_backing(&self) -> bool {
        self.dir.is_some()
    }
}
