//! Retrieval gate.
//!
//! Selects at most `k` chunks of a [`Corpus`] for a question. Scoring is
//! delegated to a [`Ranker`]; [`retrieve`] enforces the output contract
//! regardless of which ranker is plugged in:
//!
//! 1. `k` is clamped to `[1, 20]`.
//! 2. Scores are clamped to `[0.0, 1.0]`.
//! 3. Results are stably sorted by descending score.
//! 4. At most `min(k, |corpus|)` results are returned.
//!
//! The only ranker shipped is [`FirstKRanker`], which does no scoring at
//! all: it returns the first `k` chunks with a fixed score.

use anyhow::{bail, Result};

use crate::config::{RetrievalConfig, MAX_K_CEILING};
use crate::corpus::Corpus;
use crate::models::{Chunk, RetrievalResult};

/// Scores corpus chunks against a question.
pub trait Ranker: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `k` results, best first. `k` is already clamped.
    fn rank(&self, question: &str, corpus: &Corpus, k: usize) -> Vec<RetrievalResult>;
}

/// Ignores the question and takes the first `k` chunks in corpus order.
#[derive(Debug, Clone)]
pub struct FirstKRanker {
    score: f64,
}

impl FirstKRanker {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl Default for FirstKRanker {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Ranker for FirstKRanker {
    fn name(&self) -> &str {
        "first_k"
    }

    fn rank(&self, _question: &str, corpus: &Corpus, k: usize) -> Vec<RetrievalResult> {
        corpus
            .iter()
            .take(k)
            .map(|chunk| to_result(chunk, self.score))
            .collect()
    }
}

pub fn to_result(chunk: &Chunk, score: f64) -> RetrievalResult {
    RetrievalResult {
        id: chunk.id.clone(),
        source: chunk.source,
        content: chunk.content.clone(),
        score,
    }
}

/// Instantiate the ranker named in `[retrieval].ranker`.
pub fn create_ranker(config: &RetrievalConfig) -> Result<Box<dyn Ranker>> {
    match config.ranker.as_str() {
        "first_k" => Ok(Box::new(FirstKRanker::new(config.stub_score))),
        other => bail!("Unknown ranker: '{}'. Must be first_k.", other),
    }
}

pub fn clamp_k(k: usize) -> usize {
    k.clamp(1, MAX_K_CEILING)
}

/// Run `ranker` and enforce the gate's output contract.
pub fn retrieve(
    ranker: &dyn Ranker,
    question: &str,
    corpus: &Corpus,
    k: usize,
) -> Vec<RetrievalResult> {
    let k = clamp_k(k);
    let mut results = ranker.rank(question, corpus, k);

    for r in &mut results {
        r.score = if r.score.is_nan() {
            0.0
        } else {
            r.score.clamp(0.0, 1.0)
        };
    }

    // sort_by is stable, equal scores keep ranker order
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    results.truncate(k.min(corpus.len()));
    results
}
