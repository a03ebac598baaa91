// Catalog entries exposed as MCP resources under `mcp:///<id>`

use crate::error::McpError;
use crate::protocol::{ReadResourceResult, Resource, ResourceContents};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use rag_mcp_core::{CatalogSnapshot, Descriptor};

pub const RESOURCE_SCHEME: &str = "mcp";
pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// Characters escaped when an id becomes the single path segment of a URI
const ID_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn resource_uri(id: &str) -> String {
    format!(
        "{}:///{}",
        RESOURCE_SCHEME,
        utf8_percent_encode(id, ID_SEGMENT)
    )
}

pub fn list(snapshot: &CatalogSnapshot) -> Vec<Resource> {
    snapshot
        .catalog
        .iter()
        .map(|(id, descriptor)| Resource {
            uri: resource_uri(id),
            name: descriptor.name.clone(),
            description: Some(descriptor.description.clone()),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
        })
        .collect()
}

/// Descriptor body as embedded in resource reads and prompts
pub fn contents(id: &str, descriptor: &Descriptor) -> Result<ResourceContents, McpError> {
    Ok(ResourceContents {
        uri: resource_uri(id),
        mime_type: RESOURCE_MIME_TYPE.to_string(),
        text: serde_json::to_string_pretty(descriptor)?,
    })
}

pub fn read(snapshot: &CatalogSnapshot, uri: &str) -> Result<ReadResourceResult, McpError> {
    let parsed = url::Url::parse(uri)
        .map_err(|e| McpError::InvalidParams(format!("Invalid resource URI {}: {}", uri, e)))?;

    let path = parsed.path();
    let segment = path.strip_prefix('/').unwrap_or(path);
    let id = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| McpError::InvalidParams(format!("Invalid resource URI {}: {}", uri, e)))?;

    let descriptor = snapshot
        .catalog
        .get(&id)
        .ok_or_else(|| McpError::ResourceNotFound(id.to_string()))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContents {
            // Echo the URI as the client sent it
            uri: uri.to_string(),
            ..contents(&id, descriptor)?
        }],
    })
}
