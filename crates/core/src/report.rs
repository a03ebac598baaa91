// Human-readable rendering of a match result

use crate::types::{Catalog, MatchResult};
use std::fmt::Write;

pub const NO_MATCH_MESSAGE: &str = "No matching MCP found for this task.";

const MISSING_DETAILS: &str = "details not found in the current catalog";

/// Render `result` as Markdown.
///
/// Ids that are not in `catalog` are still listed, with a note instead of
/// their details: the catalog may have been reloaded since matching.
pub fn format_match_report(result: &MatchResult, catalog: &Catalog) -> String {
    if result.is_empty() {
        return format!("{}\n", NO_MATCH_MESSAGE);
    }

    let mut out = String::new();
    let best = result.best_match_id.as_deref();

    if let Some(id) = best {
        out.push_str("## Best Matching MCP\n\n");
        write_entry(&mut out, id, catalog, "");
    }

    if !result.relevant_match_ids.is_empty() {
        out.push_str("## Relevant MCPs\n\n");
        for id in &result.relevant_match_ids {
            let marker = if Some(id.as_str()) == best { "✓ " } else { "" };
            write_entry(&mut out, id, catalog, marker);
        }
    }

    out
}

fn write_entry(out: &mut String, id: &str, catalog: &Catalog, marker: &str) {
    // Writing to a String cannot fail
    let _ = match catalog.get(id) {
        Some(d) => write!(
            out,
            "- {}**{}** (ID: {})\n  Description: {}\n  Functions: {}\n\n",
            marker,
            d.name,
            id,
            d.description,
            d.functions.join(", ")
        ),
        None => write!(out, "- {}ID: {} ({})\n\n", marker, id, MISSING_DETAILS),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    #[test]
    fn test_empty_result() {
        let text = format_match_report(&MatchResult::empty(), &default_catalog());

        assert!(text.to_lowercase().contains("no matching mcp found"));
        assert!(!text.contains("##"));
        assert!(!text.contains("ID:"));
    }

    #[test]
    fn test_best_and_relevant_sections() {
        let result = MatchResult {
            best_match_id: Some("calendar".to_string()),
            relevant_match_ids: vec!["calendar".to_string(), "todo".to_string()],
        };
        let text = format_match_report(&result, &default_catalog());

        let best_at = text.find("## Best Matching MCP").unwrap();
        let relevant_at = text.find("## Relevant MCPs").unwrap();
        assert!(best_at < relevant_at);

        assert!(text.contains("- **Calendar MCP** (ID: calendar)"));
        assert!(text.contains("- ✓ **Calendar MCP** (ID: calendar)"));
        assert!(text.contains("- **Todo MCP** (ID: todo)"));
        assert!(text.contains("  Functions: addTask, listTasks, completeTask"));
        assert_eq!(text.matches('✓').count(), 1);
    }

    #[test]
    fn test_unknown_ids_are_shown_raw() {
        let result = MatchResult {
            best_match_id: Some("retired".to_string()),
            relevant_match_ids: vec!["retired".to_string(), "weather".to_string()],
        };
        let text = format_match_report(&result, &default_catalog());

        assert!(text.contains("- ID: retired (details not found in the current catalog)"));
        assert!(text.contains("- ✓ ID: retired (details not found in the current catalog)"));
        assert!(text.contains("**Weather MCP** (ID: weather)"));
    }

    #[test]
    fn test_relevant_only() {
        let result = MatchResult {
            best_match_id: None,
            relevant_match_ids: vec!["weather".to_string()],
        };
        let text = format_match_report(&result, &default_catalog());

        assert!(!text.contains("## Best Matching MCP"));
        assert!(text.starts_with("## Relevant MCPs"));
        assert!(!text.contains('✓'));
    }
}
