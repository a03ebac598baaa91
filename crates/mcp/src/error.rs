// Request-level failures reported back to the MCP client

use crate::protocol::JsonRpcError;

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("MCP {0} not found")]
    ResourceNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            Self::MethodNotFound(_) => JsonRpcError::METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::UnknownTool(_) | Self::UnknownPrompt(_) => {
                JsonRpcError::INVALID_PARAMS
            }
            Self::ResourceNotFound(_) => JsonRpcError::RESOURCE_NOT_FOUND,
            Self::Internal(_) => JsonRpcError::INTERNAL_ERROR,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(error: McpError) -> Self {
        JsonRpcError::custom(error.code(), error.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
