// The `match_mcp` tool: task description in, ranked catalog entries out

use crate::error::McpError;
use crate::protocol::{CallToolResult, ToolContent, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, Tool};
use rag_mcp_core::{
    format_match_report, CatalogSnapshot, CatalogStore, MatchResult, MatchStrategy,
};
use std::sync::Arc;

pub const TOOL_NAME: &str = "match_mcp";

/// Runs the configured strategies in order against one catalog snapshot.
///
/// The first strategy that succeeds decides the answer, even when that
/// answer is empty. If every strategy fails the result is empty.
pub struct MatchMcpTool {
    catalog: Arc<CatalogStore>,
    strategies: Vec<Arc<dyn MatchStrategy>>,
}

impl MatchMcpTool {
    pub fn new(catalog: Arc<CatalogStore>, primary: Arc<dyn MatchStrategy>) -> Self {
        Self {
            catalog,
            strategies: vec![primary],
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn MatchStrategy>) -> Self {
        self.strategies.push(fallback);
        self
    }

    async fn run_strategies(&self, task: &str, snapshot: &CatalogSnapshot) -> MatchResult {
        for strategy in &self.strategies {
            match strategy.find_matches(task, snapshot).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Matching strategy failed"
                    );
                }
            }
        }
        MatchResult::empty()
    }
}

#[async_trait::async_trait]
impl Tool for MatchMcpTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: TOOL_NAME.to_string(),
            description: "Find MCPs that match a task description".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "taskDescription": json_schema_string("Description of the task that needs an MCP")
                }),
                vec!["taskDescription"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult, McpError> {
        let task = arguments
            .get("taskDescription")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|task| !task.is_empty())
            .ok_or_else(|| McpError::InvalidParams("Task description is required".to_string()))?;

        // One snapshot for matching and formatting, whatever reloads happen meanwhile
        let snapshot = self.catalog.snapshot();
        let result = self.run_strategies(task, &snapshot).await;
        let report = format_match_report(&result, &snapshot.catalog);

        Ok(CallToolResult {
            content: vec![ToolContent::text(report)],
            is_error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_mcp_core::oracle::OracleError;
    use rag_mcp_core::{Catalog, Descriptor, MatchError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStrategy {
        result: MatchResult,
        calls: AtomicUsize,
    }

    impl FixedStrategy {
        fn new(best: Option<&str>, relevant: &[&str]) -> Self {
            Self {
                result: MatchResult {
                    best_match_id: best.map(str::to_string),
                    relevant_match_ids: relevant.iter().map(|s| s.to_string()).collect(),
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl MatchStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn find_matches(
            &self,
            _task: &str,
            snapshot: &CatalogSnapshot,
        ) -> Result<MatchResult, MatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone().validated(&snapshot.catalog))
        }
    }

    struct FailingStrategy;

    #[async_trait::async_trait]
    impl MatchStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn find_matches(
            &self,
            _task: &str,
            _snapshot: &CatalogSnapshot,
        ) -> Result<MatchResult, MatchError> {
            Err(MatchError::Oracle(OracleError::InvalidResponse(
                "connection reset".to_string(),
            )))
        }
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_task_is_rejected() {
        let tool = MatchMcpTool::new(
            Arc::new(CatalogStore::default()),
            Arc::new(FixedStrategy::new(Some("weather"), &["weather"])),
        );

        for arguments in [
            serde_json::json!({ "taskDescription": "" }),
            serde_json::json!({}),
            serde_json::json!({ "taskDescription": 12 }),
            serde_json::Value::Null,
        ] {
            let err = tool.execute(arguments).await.unwrap_err();
            assert!(matches!(err, McpError::InvalidParams(_)));
            assert!(err.to_string().contains("required"));
        }
    }

    #[tokio::test]
    async fn test_whitespace_only_task_is_rejected() {
        let strategy = Arc::new(FixedStrategy::new(Some("weather"), &["weather"]));
        let tool = MatchMcpTool::new(Arc::new(CatalogStore::default()), strategy.clone());

        for blank in [" ", "\t\n", "   \r\n  "] {
            let err = tool
                .execute(serde_json::json!({ "taskDescription": blank }))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Task description is required");
        }
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    }

    /// Publishes a new catalog mid-match, like a SIGHUP reload would
    struct ReloadingStrategy {
        store: Arc<CatalogStore>,
    }

    #[async_trait::async_trait]
    impl MatchStrategy for ReloadingStrategy {
        fn name(&self) -> &'static str {
            "reloading"
        }

        async fn find_matches(
            &self,
            _task: &str,
            snapshot: &CatalogSnapshot,
        ) -> Result<MatchResult, MatchError> {
            self.store.publish(
                Catalog::new()
                    .with_entry("weather", Descriptor::new("Replaced Weather", "Gone", ["nothing"])),
            );
            Ok(MatchResult {
                best_match_id: Some("calendar".to_string()),
                relevant_match_ids: vec!["calendar".to_string(), "weather".to_string()],
            }
            .validated(&snapshot.catalog))
        }
    }

    #[tokio::test]
    async fn test_report_uses_snapshot_taken_before_matching() {
        let store = Arc::new(CatalogStore::default());
        let before = store.snapshot().generation;
        let tool = MatchMcpTool::new(
            store.clone(),
            Arc::new(ReloadingStrategy {
                store: store.clone(),
            }),
        );

        let result = tool
            .execute(serde_json::json!({ "taskDescription": "book a meeting" }))
            .await
            .unwrap();

        assert_ne!(store.snapshot().generation, before);

        let text = text_of(&result);
        assert!(text.contains("**Calendar MCP** (ID: calendar)"));
        assert!(text.contains("**Weather MCP** (ID: weather)"));
        assert!(!text.contains("Replaced Weather"));
        assert!(!text.contains("details not found"));
    }

    #[tokio::test]
    async fn test_reports_primary_result() {
        let tool = MatchMcpTool::new(
            Arc::new(CatalogStore::default()),
            Arc::new(FixedStrategy::new(Some("weather"), &["weather", "calendar"])),
        );

        let result = tool
            .execute(serde_json::json!({ "taskDescription": "will it snow in Oslo" }))
            .await
            .unwrap();

        let text = text_of(&result);
        assert!(text.contains("## Best Matching MCP"));
        assert!(text.contains("✓ **Weather MCP** (ID: weather)"));
        assert!(text.contains("**Calendar MCP** (ID: calendar)"));
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let fallback = Arc::new(FixedStrategy::new(Some("todo"), &["todo"]));
        let tool = MatchMcpTool::new(Arc::new(CatalogStore::default()), Arc::new(FailingStrategy))
            .with_fallback(fallback.clone());

        let result = tool
            .execute(serde_json::json!({ "taskDescription": "remind me to buy milk" }))
            .await
            .unwrap();

        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
        assert!(text_of(&result).contains("(ID: todo)"));
    }

    #[tokio::test]
    async fn test_empty_primary_answer_is_final() {
        let fallback = Arc::new(FixedStrategy::new(Some("todo"), &["todo"]));
        let tool = MatchMcpTool::new(
            Arc::new(CatalogStore::default()),
            Arc::new(FixedStrategy::new(None, &[])),
        )
        .with_fallback(fallback.clone());

        let result = tool
            .execute(serde_json::json!({ "taskDescription": "translate this poem" }))
            .await
            .unwrap();

        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
        assert!(text_of(&result).contains("No matching MCP found"));
    }

    #[tokio::test]
    async fn test_all_strategies_failing_degrades_to_no_match() {
        let tool = MatchMcpTool::new(Arc::new(CatalogStore::default()), Arc::new(FailingStrategy))
            .with_fallback(Arc::new(FailingStrategy));

        let result = tool
            .execute(serde_json::json!({ "taskDescription": "check the forecast" }))
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        assert!(text_of(&result).contains("No matching MCP found"));
    }
}
