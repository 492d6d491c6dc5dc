//! Session state and the initialize handshake.
//!
//! Negotiation is the only place logically concurrent callers can race: two
//! `tools/list` calls issued before any session exists must not produce two
//! `initialize` requests, or the server allocates two sessions for one
//! logical client. The [`Session`] collapses concurrent callers onto a
//! single shared in-flight attempt and hands every one of them the same
//! outcome.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::protocol::{Notification, Request, RequestId};
use crate::registry::Endpoint;
use crate::transport::HttpTransport;
use crate::types::{ClientCapabilities, Implementation, InitializeResult};
use crate::LATEST_PROTOCOL_VERSION;

/// Lifecycle of a session against one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Negotiating,
    Ready,
    Failed,
}

/// The one shared handshake attempt concurrent callers attach to.
///
/// The output is `Clone` so every awaiter observes the identical outcome.
type NegotiationHandle = Shared<BoxFuture<'static, Result<Option<String>, Error>>>;

struct SessionInner {
    status: SessionStatus,
    session_id: Option<String>,
    pending: Option<NegotiationHandle>,
    /// Bumped by `reset`/`abort`; a completing negotiation only installs its
    /// outcome if the epoch it started under is still current, so an aborted
    /// attempt can never clobber a fresh session.
    epoch: u64,
}

/// Instance-scoped session record for the currently active endpoint.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    identity: Implementation,
}

impl Session {
    pub fn new(identity: Implementation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                status: SessionStatus::Uninitialized,
                session_id: None,
                pending: None,
                epoch: 0,
            })),
            identity,
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.lock().await.session_id.clone()
    }

    /// Guarantees a negotiated session against `endpoint`, deduplicating
    /// concurrent attempts.
    ///
    /// `Ready` returns immediately without touching the network. While a
    /// negotiation is in flight every caller awaits the same attempt. A
    /// `Failed` session is treated like an uninitialized one and retried
    /// from scratch.
    pub async fn ensure(&self, transport: &HttpTransport, endpoint: &Endpoint) -> Result<(), Error> {
        let handle = {
            let mut inner = self.inner.lock().await;
            if inner.status == SessionStatus::Ready {
                return Ok(());
            }
            // pending is non-empty exactly while Negotiating; cloning the
            // handle attaches this caller to the in-flight attempt.
            match inner.pending.clone() {
                Some(pending) => pending,
                None => self.start_negotiation(&mut inner, transport.clone(), endpoint.clone()),
            }
        };

        handle.await.map(|_| ())
    }

    /// Discards the session without contacting the server.
    ///
    /// Any in-flight negotiation is detached: its eventual completion becomes
    /// a no-op and, once the last awaiter lets go, the underlying request is
    /// dropped.
    pub async fn reset(&self) {
        self.clear(SessionStatus::Uninitialized).await;
        tracing::debug!("Session state reset");
    }

    /// Marks the session failed, clearing any in-flight negotiation.
    ///
    /// Used by the connect timeout path; `Failed` stays eligible for a fresh
    /// handshake on the next call.
    pub async fn abort(&self) {
        self.clear(SessionStatus::Failed).await;
        tracing::debug!("Session negotiation aborted");
    }

    async fn clear(&self, status: SessionStatus) {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.status = status;
        inner.session_id = None;
        inner.pending = None;
    }

    fn start_negotiation(
        &self,
        inner: &mut SessionInner,
        transport: HttpTransport,
        endpoint: Endpoint,
    ) -> NegotiationHandle {
        inner.status = SessionStatus::Negotiating;
        inner.session_id = None;
        let epoch = inner.epoch;

        let state = Arc::clone(&self.inner);
        let identity = self.identity.clone();
        let handle = async move {
            let result = negotiate(&transport, &endpoint, &identity).await;

            let mut inner = state.lock().await;
            if inner.epoch == epoch {
                inner.pending = None;
                match &result {
                    Ok(session_id) => {
                        inner.status = SessionStatus::Ready;
                        inner.session_id = session_id.clone();
                    }
                    Err(error) => {
                        tracing::warn!(%error, server = %endpoint.id, "Session negotiation failed");
                        inner.status = SessionStatus::Failed;
                        inner.session_id = None;
                    }
                }
            } else {
                tracing::debug!(server = %endpoint.id, "Discarding stale negotiation outcome");
            }
            result
        }
        .boxed()
        .shared();

        inner.pending = Some(handle.clone());
        handle
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Performs the `initialize` / `notifications/initialized` handshake once.
///
/// Returns the session identifier from the response's transport-level header;
/// a missing header is tolerated since some endpoints are stateless.
async fn negotiate(
    transport: &HttpTransport,
    endpoint: &Endpoint,
    identity: &Implementation,
) -> Result<Option<String>, Error> {
    tracing::info!(server = %endpoint.id, url = %endpoint.url, "Negotiating MCP session");

    let params = json!({
        "protocolVersion": LATEST_PROTOCOL_VERSION,
        "capabilities": ClientCapabilities::default(),
        "clientInfo": identity,
    });
    let request = Request::new("initialize", Some(params), RequestId::Number(0));

    let reply = transport
        .request(endpoint, None, &request)
        .await
        .map_err(|error| match error {
            // A rejected handshake is an InitFailed, whatever the status was.
            Error::Protocol(crate::error::ProtocolError::Transport { status }) => {
                Error::init_failed(format!("initialize returned HTTP {status}"))
            }
            other => other,
        })?;

    let session_id = reply.session_id;
    tracing::debug!(?session_id, "Initialize response received");

    match reply.envelope.into_result() {
        Ok(result) => {
            if let Ok(init) = serde_json::from_value::<InitializeResult>(result) {
                if let Some(server) = init.server_info {
                    tracing::info!(server_name = %server.name, server_version = %server.version, "Server identified");
                }
            }
        }
        Err(error) => return Err(Error::init_failed(error.to_string())),
    }

    // Acknowledgment is fire-and-forget: some servers do not require it, so
    // neither a non-success status nor a failed send aborts the negotiation.
    let notification = Notification::new("notifications/initialized", None);
    match transport
        .notify(endpoint, session_id.as_deref(), &notification)
        .await
    {
        Ok(status) if !status.is_success() => {
            tracing::warn!(%status, "initialized notification rejected");
        }
        Ok(_) => {}
        Err(error) => {
            tracing::warn!(%error, "initialized notification could not be sent");
        }
    }

    tracing::info!(server = %endpoint.id, ?session_id, "MCP session established");
    Ok(session_id)
}
