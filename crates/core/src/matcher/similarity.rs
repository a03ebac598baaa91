// Embedding-similarity strategy
//
// Every descriptor is embedded once per catalog generation. A query embeds
// the task and ranks entries by cosine similarity.
//
// Zero-norm or mismatched-dimension vectors have no score; those entries
// are skipped for the query rather than ranked.

use super::{MatchError, MatchStrategy};
use crate::catalog::CatalogSnapshot;
use crate::oracle::{EmbeddingOracle, OracleError};
use crate::types::MatchResult;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_TOP_K: usize = 5;

/// Cosine similarity of two vectors, or `None` when it is undefined
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return None;
    }

    let score = dot / denominator;
    score.is_finite().then_some(score as f32)
}

/// Per-generation embedding of every catalog entry, in catalog order
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    generation: u64,
    entries: Vec<(String, Vec<f32>)>,
}

impl EmbeddingIndex {
    pub fn new(generation: u64, entries: Vec<(String, Vec<f32>)>) -> Self {
        Self {
            generation,
            entries,
        }
    }

    /// Embed every descriptor of `snapshot`
    pub async fn build(
        snapshot: &CatalogSnapshot,
        oracle: &dyn EmbeddingOracle,
    ) -> Result<Self, OracleError> {
        let mut entries = Vec::with_capacity(snapshot.catalog.len());
        for (id, descriptor) in snapshot.catalog.iter() {
            let vector = oracle.embed(&descriptor.embedding_text()).await?;
            entries.push((id.to_string(), vector));
        }

        tracing::info!(
            generation = snapshot.generation,
            entries = entries.len(),
            "Built embedding index"
        );
        Ok(Self::new(snapshot.generation, entries))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scorable entries sorted by descending score; equal scores keep
    /// catalog order.
    pub fn rank(&self, query: &[f32]) -> Vec<(&str, f32)> {
        let mut scored: Vec<(&str, f32)> = self
            .entries
            .iter()
            .filter_map(|(id, vector)| {
                cosine_similarity(query, vector).map(|score| (id.as_str(), score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Entry with the strictly greatest score; the first one wins a tie
    pub fn best(&self, query: &[f32]) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for (id, vector) in &self.entries {
            let Some(score) = cosine_similarity(query, vector) else {
                continue;
            };
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((id.as_str(), score));
            }
        }
        best
    }
}

/// Ranks the catalog by embedding similarity to the task
pub struct SimilarityStrategy {
    oracle: Arc<dyn EmbeddingOracle>,
    top_k: usize,
    index: Mutex<Option<Arc<EmbeddingIndex>>>,
}

impl SimilarityStrategy {
    pub fn new(oracle: Arc<dyn EmbeddingOracle>) -> Self {
        Self {
            oracle,
            top_k: DEFAULT_TOP_K,
            index: Mutex::new(None),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Embed `snapshot` from scratch and make it the cached index
    pub async fn build_index(
        &self,
        snapshot: &CatalogSnapshot,
    ) -> Result<Arc<EmbeddingIndex>, OracleError> {
        let mut cached = self.index.lock().await;
        let index = Arc::new(EmbeddingIndex::build(snapshot, self.oracle.as_ref()).await?);
        *cached = Some(index.clone());
        Ok(index)
    }

    /// The cached index if it belongs to `snapshot`'s generation, otherwise
    /// a freshly built one. Vectors never outlive their generation.
    pub async fn index_for(
        &self,
        snapshot: &CatalogSnapshot,
    ) -> Result<Arc<EmbeddingIndex>, OracleError> {
        let mut cached = self.index.lock().await;
        if let Some(index) = cached.as_ref() {
            if index.generation() == snapshot.generation {
                return Ok(index.clone());
            }
            tracing::info!(
                stale = index.generation(),
                current = snapshot.generation,
                "Catalog changed, rebuilding embedding index"
            );
        }

        let index = Arc::new(EmbeddingIndex::build(snapshot, self.oracle.as_ref()).await?);
        *cached = Some(index.clone());
        Ok(index)
    }

    pub async fn find_best(
        &self,
        task: &str,
        index: &EmbeddingIndex,
    ) -> Result<Option<String>, OracleError> {
        if index.is_empty() {
            return Ok(None);
        }
        let query = self.oracle.embed(task).await?;
        Ok(index.best(&query).map(|(id, _)| id.to_string()))
    }

    pub async fn find_top(
        &self,
        task: &str,
        index: &EmbeddingIndex,
        k: usize,
    ) -> Result<Vec<String>, OracleError> {
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query = self.oracle.embed(task).await?;
        Ok(index
            .rank(&query)
            .into_iter()
            .take(k)
            .map(|(id, _)| id.to_string())
            .collect())
    }
}

#[async_trait::async_trait]
impl MatchStrategy for SimilarityStrategy {
    fn name(&self) -> &'static str {
        "similarity"
    }

    async fn find_matches(
        &self,
        task: &str,
        snapshot: &CatalogSnapshot,
    ) -> Result<MatchResult, MatchError> {
        let index = self.index_for(snapshot).await?;
        let relevant_match_ids = self.find_top(task, &index, self.top_k).await?;

        tracing::info!(matches = ?relevant_match_ids, "Similarity ranking complete");

        Ok(MatchResult {
            best_match_id: relevant_match_ids.first().cloned(),
            relevant_match_ids,
        }
        .validated(&snapshot.catalog))
    }
}
