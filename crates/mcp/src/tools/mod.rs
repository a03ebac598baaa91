pub mod match_mcp;
mod registry;

pub use match_mcp::MatchMcpTool;
pub use registry::{json_schema_object, json_schema_string, Tool, ToolRegistry};
