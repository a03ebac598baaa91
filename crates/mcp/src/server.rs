// MCP server: newline-delimited JSON-RPC 2.0 over stdio

use crate::codec::{RequestCodec, RequestFrame};
use crate::error::McpError;
use crate::prompts;
use crate::protocol::*;
use crate::resources;
use crate::tools::ToolRegistry;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use rag_mcp_core::CatalogStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

/// Longest request line accepted by default
pub const MAX_LINE_LENGTH: usize = 4 * 1024 * 1024;

pub const SERVER_NAME: &str = "rag-mcp";

pub struct McpServer {
    catalog: Arc<CatalogStore>,
    tools: ToolRegistry,
    max_line_length: usize,
}

impl McpServer {
    pub fn new(catalog: Arc<CatalogStore>, tools: ToolRegistry) -> Self {
        Self {
            catalog,
            tools,
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Serve on stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!(tools = self.tools.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Process requests one line at a time until the reader reaches EOF
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FramedRead::new(reader, RequestCodec::new(self.max_line_length));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(frame) = frames.next().await {
            let line = match frame? {
                RequestFrame::Line(line) => line,
                RequestFrame::Oversized => {
                    // The id is unreadable, so the client gets a null-id error
                    tracing::warn!(max = self.max_line_length, "Rejecting oversized request line");
                    let response =
                        JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::invalid_request());
                    sink.send(serde_json::to_string(&response)?).await?;
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                sink.send(serde_json::to_string(&response)?).await?;
            }
        }

        Ok(())
    }

    /// Decode one line and answer it. Notifications yield `None`.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed JSON-RPC line");
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid JSON-RPC request");
                Some(JsonRpcResponse::error(
                    id.unwrap_or(serde_json::Value::Null),
                    JsonRpcError::invalid_request(),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Ignoring notification");
            return None;
        };

        tracing::debug!(method = %request.method, "Handling request");
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::debug!(method = %request.method, error = %e, "Request failed");
                JsonRpcResponse::error(id, e.into())
            }
        };
        Some(response)
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, McpError> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_params(params).unwrap_or_default();
                if let Some(client) = &params.client_info {
                    tracing::info!(client = %client.name, version = %client.version, "Client connected");
                }
                Ok(serde_json::to_value(self.initialize(params))?)
            }
            "ping" => Ok(serde_json::json!({})),
            "resources/list" => {
                let snapshot = self.catalog.snapshot();
                Ok(serde_json::to_value(ListResourcesResult {
                    resources: resources::list(&snapshot),
                })?)
            }
            "resources/read" => {
                let params: ReadResourceParams = parse_params(params)?;
                let snapshot = self.catalog.snapshot();
                Ok(serde_json::to_value(resources::read(&snapshot, &params.uri)?)?)
            }
            "tools/list" => Ok(serde_json::to_value(ListToolsResult {
                tools: self.tools.list_schemas(),
            })?),
            "tools/call" => {
                let params: CallToolParams = parse_params(params)?;
                let tool = self
                    .tools
                    .get(&params.name)
                    .ok_or_else(|| McpError::UnknownTool(params.name.clone()))?;

                tracing::info!(tool = %params.name, "Calling tool");
                Ok(serde_json::to_value(tool.execute(params.arguments).await?)?)
            }
            "prompts/list" => Ok(serde_json::to_value(ListPromptsResult {
                prompts: prompts::list(),
            })?),
            "prompts/get" => {
                let params: GetPromptParams = parse_params(params)?;
                let snapshot = self.catalog.snapshot();
                Ok(serde_json::to_value(prompts::get(&snapshot, &params.name)?)?)
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: InitializeParams) -> InitializeResult {
        InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability { list_changed: false }),
                resources: Some(ListChangedCapability { list_changed: false }),
                prompts: Some(ListChangedCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, McpError> {
    let params = params.ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params)
        .map_err(|e| McpError::InvalidParams(format!("Invalid params: {}", e)))
}
