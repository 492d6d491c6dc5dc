//! HTTP transport and response decoding.
//!
//! MCP over HTTP answers a POST with either a plain JSON body or a
//! Server-Sent-Events body framing one JSON-RPC envelope behind a `data:`
//! line. The same endpoint may switch format between calls, so the decode
//! branch is chosen from the response content type, never from caller state.

mod decode;
mod http;

pub use decode::{decode, ResponseFormat};
pub use http::{HttpTransport, RpcReply};
