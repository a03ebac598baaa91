// The `mcp_selection_guide` prompt

use crate::error::McpError;
use crate::protocol::{GetPromptResult, Prompt, PromptContent, PromptMessage};
use crate::resources;
use rag_mcp_core::CatalogSnapshot;

pub const SELECTION_GUIDE: &str = "mcp_selection_guide";

const SELECTION_GUIDE_DESCRIPTION: &str = "Get guidance on selecting the right MCP for your task";

const INTRO: &str =
    "I need guidance on selecting the right MCP for my task. Here are the available MCPs:";

const CLOSING: &str = "Please help me choose the most appropriate MCP based on my task requirements. For each MCP, explain what kinds of tasks it's suitable for.";

pub fn list() -> Vec<Prompt> {
    vec![Prompt {
        name: SELECTION_GUIDE.to_string(),
        description: Some(SELECTION_GUIDE_DESCRIPTION.to_string()),
    }]
}

/// Intro, one embedded resource per catalog entry, then the closing request
pub fn get(snapshot: &CatalogSnapshot, name: &str) -> Result<GetPromptResult, McpError> {
    if name != SELECTION_GUIDE {
        return Err(McpError::UnknownPrompt(name.to_string()));
    }

    let mut messages = Vec::with_capacity(snapshot.catalog.len() + 2);
    messages.push(PromptMessage::user(PromptContent::Text {
        text: INTRO.to_string(),
    }));

    for (id, descriptor) in snapshot.catalog.iter() {
        messages.push(PromptMessage::user(PromptContent::Resource {
            resource: resources::contents(id, descriptor)?,
        }));
    }

    messages.push(PromptMessage::user(PromptContent::Text {
        text: CLOSING.to_string(),
    }));

    Ok(GetPromptResult {
        description: Some(SELECTION_GUIDE_DESCRIPTION.to_string()),
        messages,
    })
}
