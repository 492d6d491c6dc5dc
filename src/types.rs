//! Common MCP types used throughout the crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client or server identity announced during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: "mcp-http-client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Capabilities announced by the client in `initialize`.
///
/// This client announces none; the type exists so the handshake serializes an
/// explicit empty capability object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {}

/// The `result` payload of a successful `initialize` call.
///
/// Only the fields this client inspects are modeled; the capability object is
/// kept opaque.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Value>,
    #[serde(default)]
    pub server_info: Option<Implementation>,
}

/// A named, schema-described remote operation invocable via `tools/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// The `result` payload of `tools/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// One block of tool output content.
///
/// Content is passed through verbatim; nothing beyond the `type` discriminator
/// is interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The `result` payload of `tools/call`, forwarded to the caller as the remote
/// tool produced it, including a tool-level `isError` flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// A resource advertised by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// The `result` payload of `resources/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourcesResult {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_deserializes_camel_case_schema() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "add-note",
            "description": "Add a new note",
            "inputSchema": {"type": "object", "properties": {"name": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(tool.name, "add-note");
        assert_eq!(tool.input_schema["type"], "object");
    }

    #[test]
    fn call_tool_result_defaults_is_error_to_false() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "done"}]
        }))
        .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content[0].kind, "text");
        assert_eq!(result.content[0].text.as_deref(), Some("done"));
    }

    #[test]
    fn content_blocks_keep_unknown_types() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "image", "data": {"base64": "AAAA"}}],
            "isError": true
        }))
        .unwrap();
        assert!(result.is_error);
        assert_eq!(result.content[0].kind, "image");
        assert!(result.content[0].text.is_none());
        assert!(result.content[0].data.is_some());
    }

    #[test]
    fn initialize_result_tolerates_missing_fields() {
        let init: InitializeResult = serde_json::from_value(json!({})).unwrap();
        assert!(init.protocol_version.is_none());
        assert!(init.server_info.is_none());
    }
}
