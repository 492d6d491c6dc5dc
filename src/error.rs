use std::time::Duration;

use thiserror::Error;

/// Wire- and protocol-level failures surfaced by the transport, the response
/// decoder, and the session negotiator.
///
/// These always travel to the caller of the triggering facade operation; the
/// crate performs no implicit retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The response body could not be parsed as a JSON-RPC envelope.
    #[error("malformed JSON response: {0}")]
    MalformedJson(String),

    /// An event-stream body carried no `data:` line to decode.
    #[error("event stream response carried no data line")]
    MalformedStream,

    /// The initialize handshake failed.
    #[error("initialize handshake failed: {0}")]
    InitFailed(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP status {status}")]
    Transport { status: u16 },

    /// The decoded envelope carried a JSON-RPC error object.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
}

/// Error type for all client operations.
///
/// Registry and state-precondition variants (`Conflict`, `NotFound`,
/// `Policy`, `NoServerSelected`, `NotConnected`) indicate caller misuse and
/// are produced without touching the network. The type is `Clone` so a single
/// failed negotiation can hand the identical error to every caller that was
/// awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A server with the same id is already registered.
    #[error("server id '{0}' is already registered")]
    Conflict(String),

    /// No server with the given id exists in the registry.
    #[error("unknown server id '{0}'")]
    NotFound(String),

    /// The operation is not permitted for built-in servers.
    #[error("built-in server '{0}' cannot be removed")]
    Policy(String),

    /// An operation needing a target server was called before selecting one.
    #[error("no server selected")]
    NoServerSelected,

    /// An operation requiring an established connection was called without one.
    #[error("not connected to an MCP server")]
    NotConnected,

    /// The connect budget elapsed before the server answered.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Wire- or protocol-level failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The HTTP request could not be performed at all (DNS, refused
    /// connection, TLS, ...).
    #[error("http request failed: {0}")]
    Http(String),

    /// The server-list configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`ProtocolError::Remote`] wrapped in [`Error`].
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Error::Protocol(ProtocolError::Remote {
            code,
            message: message.into(),
        })
    }

    /// Shorthand for a [`ProtocolError::InitFailed`] wrapped in [`Error`].
    pub fn init_failed(message: impl Into<String>) -> Self {
        Error::Protocol(ProtocolError::InitFailed(message.into()))
    }
}
