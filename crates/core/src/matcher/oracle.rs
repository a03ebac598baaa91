// Oracle-backed strategy: the chat oracle picks ids from a catalog listing

use super::{MatchError, MatchStrategy};
use crate::catalog::CatalogSnapshot;
use crate::oracle::{ChatOracle, ChatRequest};
use crate::types::{Catalog, MatchResult};
use serde_json::Value;
use std::sync::Arc;

const SYSTEM_PROMPT_PREAMBLE: &str = "You are an expert assistant helping to select the most appropriate Model Context Protocol (MCP) component for a given task.
Based on the user's task description and the list of available MCPs below, identify the single best matching MCP ID.
If other MCPs also seem relevant, list their IDs as well.
Respond ONLY with a JSON object containing two keys:
1. 'bestMatchId': A string containing the ID of the single best matching MCP, or null if no single best match is clear.
2. 'relevantMatchIds': An array of strings containing the IDs of all relevant MCPs (including the best match, if one exists). Return an empty array if no MCPs are relevant.";

/// Deterministic textual listing of the catalog, in catalog order
pub fn render_catalog_listing(catalog: &Catalog) -> String {
    catalog
        .iter()
        .map(|(id, d)| {
            format!(
                "ID: {}\nName: {}\nDescription: {}\nFunctions: {}",
                id,
                d.name,
                d.description,
                d.functions.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn system_prompt(catalog: &Catalog) -> String {
    format!(
        "{}\n\nAvailable MCPs:\n{}",
        SYSTEM_PROMPT_PREAMBLE,
        render_catalog_listing(catalog)
    )
}

/// Decode a raw oracle reply and validate it against `catalog`.
///
/// The reply must be JSON; beyond that nothing about its shape is trusted.
/// A non-string `bestMatchId` counts as absent, a non-array
/// `relevantMatchIds` as empty, and non-string entries are skipped.
pub fn decode_oracle_reply(raw: &str, catalog: &Catalog) -> Result<MatchResult, MatchError> {
    let value: Value = serde_json::from_str(raw)?;

    let best_match_id = value
        .get("bestMatchId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let relevant_match_ids = value
        .get("relevantMatchIds")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(MatchResult {
        best_match_id,
        relevant_match_ids,
    }
    .validated(catalog))
}

/// Asks a chat oracle to choose directly from the catalog
pub struct OracleStrategy {
    oracle: Arc<dyn ChatOracle>,
    temperature: f32,
}

impl OracleStrategy {
    pub fn new(oracle: Arc<dyn ChatOracle>) -> Self {
        Self {
            oracle,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Like [`MatchStrategy::find_matches`], but any failure becomes the
    /// empty result.
    pub async fn match_via_oracle(&self, task: &str, snapshot: &CatalogSnapshot) -> MatchResult {
        match self.find_matches(task, snapshot).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Oracle matching failed, returning no matches");
                MatchResult::empty()
            }
        }
    }
}

#[async_trait::async_trait]
impl MatchStrategy for OracleStrategy {
    fn name(&self) -> &'static str {
        "oracle"
    }

    async fn find_matches(
        &self,
        task: &str,
        snapshot: &CatalogSnapshot,
    ) -> Result<MatchResult, MatchError> {
        tracing::info!(
            generation = snapshot.generation,
            "Asking oracle to match task \"{}\"",
            task
        );

        let request = ChatRequest::new(
            system_prompt(&snapshot.catalog),
            format!("Task Description: {}", task),
        )
        .with_temperature(self.temperature);

        let raw = self.oracle.complete_json(request).await?;
        tracing::debug!("Oracle raw reply: {}", raw);

        let result = decode_oracle_reply(&raw, &snapshot.catalog)?;
        tracing::info!(
            best = ?result.best_match_id,
            relevant = ?result.relevant_match_ids,
            "Oracle match validated"
        );
        Ok(result)
    }
}
