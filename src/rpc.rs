//! JSON-RPC dispatch on top of the HTTP transport.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::protocol::{Request, RequestId};
use crate::registry::Endpoint;
use crate::session::Session;
use crate::transport::HttpTransport;

/// Builds and sends single JSON-RPC requests, negotiating a session first
/// when none exists.
///
/// Cheap to clone; clones share the session and the request-id counter.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    transport: HttpTransport,
    session: Session,
    request_counter: Arc<AtomicI64>,
}

impl Dispatcher {
    pub fn new(transport: HttpTransport, session: Session) -> Self {
        Self {
            transport,
            session,
            request_counter: Arc::new(AtomicI64::new(0)),
        }
    }

    /// The session this dispatcher negotiates through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sends `method` to `endpoint` and returns the envelope's `result`.
    ///
    /// Ensures the handshake first; this is the suspension point where
    /// concurrent first calls collapse onto one negotiation. A protocol-level
    /// `error` object is translated into [`crate::ProtocolError::Remote`].
    pub async fn call(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, Error> {
        self.session.ensure(&self.transport, endpoint).await?;

        let id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let request = Request::new(method, params, RequestId::Number(id));
        let session_id = self.session.session_id().await;

        let reply = self
            .transport
            .request(endpoint, session_id.as_deref(), &request)
            .await?;

        Ok(reply.envelope.into_result()?)
    }
}
