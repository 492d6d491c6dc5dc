//! JSON-RPC 2.0 envelope types.
//!
//! MCP frames every exchange as a JSON-RPC 2.0 message: requests carry an
//! `id` and expect a response, notifications carry no `id` and expect none.
//! A response envelope carries exactly one of `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::JSONRPC_VERSION;

/// A request identifier, either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

/// A JSON-RPC request expecting a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

impl Request {
    pub fn new(method: &str, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// A JSON-RPC notification; fire-and-forget, carries no id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// The `error` member of a response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Collapses the envelope into its payload, translating a protocol-level
    /// `error` object into [`ProtocolError::Remote`].
    ///
    /// An envelope carrying neither member violates the JSON-RPC contract and
    /// is reported as malformed.
    pub fn into_result(self) -> Result<Value, ProtocolError> {
        if let Some(error) = self.error {
            return Err(ProtocolError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| {
            ProtocolError::MalformedJson("response carried neither result nor error".to_string())
        })
    }
}
