// Core types and matching logic for the rag-mcp server

pub mod catalog;
pub mod matcher;
pub mod oracle;
pub mod report;
pub mod settings;
pub mod types;

pub use catalog::{CatalogLoad, CatalogSnapshot, CatalogStore};
pub use matcher::{MatchError, MatchStrategy, OracleStrategy, SimilarityStrategy};
pub use report::format_match_report;
pub use types::*;
