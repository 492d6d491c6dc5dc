//! # MCP HTTP Client
//!
//! A client-side runtime for the Model Context Protocol (MCP) over HTTP.
//! It performs the `initialize` / `notifications/initialized` handshake,
//! tracks the negotiated session identifier, dispatches JSON-RPC calls, and
//! decodes responses delivered either as plain JSON or as a Server-Sent-Events
//! stream carrying a single `data:` line.
//!
//! ## Features
//!
//! - Session negotiation with deduplication of concurrent handshake attempts
//! - Dual-format (JSON / SSE) response decoding driven by the content type
//! - A server registry combining built-in and user-added endpoints
//! - Async/await support using Tokio
//! - Comprehensive error handling
//!
//! ## Example
//!
//! ```no_run
//! use mcp_http_client::client::ClientBuilder;
//! use mcp_http_client::registry::Endpoint;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new()
//!         .server(Endpoint::builtin("local", "Local MCP", "http://127.0.0.1:3333/mcp"))
//!         .build()?;
//!
//!     client.switch_server("local").await?;
//!     let tools = client.connect().await?;
//!     println!("connected with {} tools", tools.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Usage
//! The [`client::McpClient`] facade is the object callers hold. See the
//! [client](crate::client) module for the connection state machine and the
//! [session](crate::session) module for the handshake rules.

/// Client facade and builder
pub mod client;
/// Server-list configuration loading and environment overrides
pub mod config;
/// Error types and handling for the crate
pub mod error;
/// JSON-RPC 2.0 envelope types
pub mod protocol;
/// Endpoint descriptors and the server registry
pub mod registry;
/// JSON-RPC dispatch on top of the HTTP transport
pub mod rpc;
/// Session state and the initialize handshake
pub mod session;
/// HTTP transport and response decoding
pub mod transport;
/// Common MCP types used throughout the crate
pub mod types;

// Re-export commonly used types for convenience
pub use client::{ClientBuilder, McpClient};
pub use error::{Error, ProtocolError};
pub use protocol::{Notification, Request, Response};
pub use registry::Endpoint;
pub use types::*;

/// The latest supported protocol version of MCP
///
/// This version represents the most recent protocol specification that this
/// crate supports. It is sent in the `initialize` request during handshake.
pub const LATEST_PROTOCOL_VERSION: &str = "2024-11-05";

/// List of all protocol versions supported by this crate
///
/// Listed in order of preference, with the most recent version first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[
    LATEST_PROTOCOL_VERSION,
    "2024-10-07",
];

/// JSON-RPC version used by the MCP protocol
///
/// MCP uses JSON-RPC 2.0 for its message format. This constant is used to
/// ensure all messages conform to the correct specification.
pub const JSONRPC_VERSION: &str = "2.0";

/// Transport-level header carrying the negotiated session identifier
pub const SESSION_ID_HEADER: &str = "mcp-session-id";
