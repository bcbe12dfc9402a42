//! Uploaded document adapter.
//!
//! Binary document ingestion (PDFs and the like) is not enabled yet. The
//! adapter takes part in every build so that turning it on later only
//! changes [`DocumentAdapter::collect`]; it must emit chunks with the same
//! id, source and non-empty content rules as every other adapter.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::SourceUnavailable;
use crate::models::{Chunk, Source};
use crate::sources::SourceAdapter;

pub struct DocumentAdapter {
    dir: Option<PathBuf>,
}

impl DocumentAdapter {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl SourceAdapter for DocumentAdapter {
    fn source(&self) -> Source {
        Source::Document
    }

    async fn collect(&self, _session: Option<&str>) -> Result<Vec<Chunk>, SourceUnavailable> {
        if let Some(dir) = &self.dir {
            tracing::debug!(dir = %dir.display(), "document ingestion disabled, skipping");
        }
        Ok(Vec::new())
    }

    fn has_backing(&self) -> bool {
        false
    }
}
