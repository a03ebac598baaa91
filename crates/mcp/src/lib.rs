// MCP (Model Context Protocol) server for the MCP catalog
// Exposes catalog entries as resources and a `match_mcp` tool over stdio

mod codec;
pub mod error;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use server::McpServer;
