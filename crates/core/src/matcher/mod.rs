//! Matching strategies: turn a task description into catalog ids.
//!
//! Strategies report failures through [`MatchError`]; choosing a fallback
//! and degrading to an empty result is left to the caller.

mod oracle;
mod similarity;

pub use oracle::{decode_oracle_reply, render_catalog_listing, OracleStrategy};
pub use similarity::{cosine_similarity, EmbeddingIndex, SimilarityStrategy, DEFAULT_TOP_K};

use crate::catalog::CatalogSnapshot;
use crate::oracle::OracleError;
use crate::types::MatchResult;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Oracle reply is not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait MatchStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Rank `snapshot` against `task`. Returned ids are always keys of
    /// `snapshot.catalog`.
    async fn find_matches(
        &self,
        task: &str,
        snapshot: &CatalogSnapshot,
    ) -> Result<MatchResult, MatchError>;
}
