//! The client facade: server selection, connection lifecycle, tool calls.
//!
//! A [`McpClient`] walks one endpoint at a time through
//! `Disconnected → Connecting → Connected`, falling to `Failed` on error.
//! Switching servers discards the session and tool cache of the previous
//! endpoint; it never multiplexes sessions across endpoints.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::error::{Error, ProtocolError};
use crate::registry::{Endpoint, ServerRegistry};
use crate::rpc::Dispatcher;
use crate::types::{CallToolResult, ListResourcesResult, ListToolsResult, Resource, Tool};

mod builder;
pub use builder::ClientBuilder;


/// Connection lifecycle of the currently selected server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Read-only snapshot produced by [`McpClient::status`].
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub connected: bool,
    pub phase: ConnectionPhase,
    pub server_id: Option<String>,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

/// Outcome of [`McpClient::reinitialize`]: the reset always happens; the
/// reconnect result is carried separately.
#[derive(Debug)]
pub struct ReinitializeReport {
    pub reconnected: bool,
    pub tools: Vec<Tool>,
    pub error: Option<Error>,
}

struct ClientState {
    registry: ServerRegistry,
    selected: Option<Endpoint>,
    phase: ConnectionPhase,
    tools: Vec<Tool>,
}

/// The object a caller holds to talk to MCP servers.
///
/// All operations take `&self`; the facade is safe to share across logically
/// concurrent tasks, and concurrent first calls share one handshake.
pub struct McpClient {
    dispatcher: Dispatcher,
    state: RwLock<ClientState>,
    connect_budget: Duration,
}

impl McpClient {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        registry: ServerRegistry,
        selected: Option<Endpoint>,
        connect_budget: Duration,
    ) -> Self {
        Self {
            dispatcher,
            state: RwLock::new(ClientState {
                registry,
                selected,
                phase: ConnectionPhase::Disconnected,
                tools: Vec::new(),
            }),
            connect_budget,
        }
    }

    /// All registered servers, built-ins first.
    pub async fn servers(&self) -> Vec<Endpoint> {
        let state = self.state.read().await;
        state.registry.list_all().into_iter().cloned().collect()
    }

    /// The registry's default server, if any.
    pub async fn default_server(&self) -> Option<Endpoint> {
        self.state.read().await.registry.default_endpoint().cloned()
    }

    /// The currently selected server, if any.
    pub async fn selected_server(&self) -> Option<Endpoint> {
        self.state.read().await.selected.clone()
    }

    /// The tool set cached by the last successful `tools/list`.
    pub async fn cached_tools(&self) -> Vec<Tool> {
        self.state.read().await.tools.clone()
    }

    /// Current connection phase.
    pub async fn phase(&self) -> ConnectionPhase {
        self.state.read().await.phase
    }

    /// Selects `id` as the active server without connecting to it.
    ///
    /// The previous endpoint's session and tool cache are discarded so a
    /// stale session identifier is never sent to the new endpoint.
    pub async fn switch_server(&self, id: &str) -> Result<Endpoint, Error> {
        let endpoint = {
            let mut state = self.state.write().await;
            let endpoint = state.registry.resolve(id)?.clone();
            state.selected = Some(endpoint.clone());
            state.phase = ConnectionPhase::Disconnected;
            state.tools.clear();
            endpoint
        };
        self.dispatcher.session().reset().await;
        tracing::info!(server = %endpoint.id, "Switched active MCP server");
        Ok(endpoint)
    }

    /// Registers a custom server.
    pub async fn add_server(&self, endpoint: Endpoint) -> Result<(), Error> {
        self.state.write().await.registry.add(endpoint)
    }

    /// Removes a custom server.
    ///
    /// Removing the selected server moves the selection back to the default
    /// endpoint and clears the session and tool cache; registry mutation and
    /// selection fallback are one update under the state lock.
    pub async fn remove_server(&self, id: &str) -> Result<(), Error> {
        let was_selected = {
            let mut state = self.state.write().await;
            state.registry.remove(id)?;
            if state.selected.as_ref().is_some_and(|e| e.id == id) {
                state.selected = state.registry.default_endpoint().cloned();
                state.phase = ConnectionPhase::Disconnected;
                state.tools.clear();
                true
            } else {
                false
            }
        };
        if was_selected {
            self.dispatcher.session().reset().await;
            tracing::info!(server = %id, "Removed the active server, fell back to default");
        }
        Ok(())
    }

    /// Connects to the currently selected server: negotiates a session as a
    /// side effect of the initial `tools/list`, caches the advertised tools.
    ///
    /// The whole attempt runs under the connect budget; on expiry the
    /// in-flight negotiation is aborted so the next call starts fresh, and a
    /// [`Error::Timeout`] distinct from transport failures is returned.
    pub async fn connect(&self) -> Result<Vec<Tool>, Error> {
        let endpoint = {
            let mut state = self.state.write().await;
            let endpoint = state.selected.clone().ok_or(Error::NoServerSelected)?;
            state.phase = ConnectionPhase::Connecting;
            endpoint
        };
        tracing::info!(server = %endpoint.id, "Connecting to MCP server");

        let outcome = timeout(
            self.connect_budget,
            self.dispatcher.call(&endpoint, "tools/list", None),
        )
        .await;

        let result = match outcome {
            Err(_) => {
                self.dispatcher.session().abort().await;
                Err(Error::Timeout(self.connect_budget))
            }
            Ok(Err(error)) => Err(error),
            Ok(Ok(value)) => parse_tools(value),
        };

        match result {
            Ok(tools) => {
                self.settle(&endpoint, ConnectionPhase::Connected, Some(tools.clone()))
                    .await;
                tracing::info!(server = %endpoint.id, count = tools.len(), "Connected");
                Ok(tools)
            }
            Err(error) => {
                // A timeout aborted the session itself, so cached tools go
                // with it; other failures leave the previous cache alone.
                let tools = matches!(error, Error::Timeout(_)).then(Vec::new);
                self.settle(&endpoint, ConnectionPhase::Failed, tools).await;
                tracing::warn!(server = %endpoint.id, %error, "Connect failed");
                Err(error)
            }
        }
    }

    /// Switches to `id` and connects in one step.
    pub async fn connect_to(&self, id: &str) -> Result<Vec<Tool>, Error> {
        self.switch_server(id).await?;
        self.connect().await
    }

    /// Fetches a fresh tool list and replaces the cache with it.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, Error> {
        let endpoint = self.connected_endpoint().await?;
        let value = self.dispatcher.call(&endpoint, "tools/list", None).await?;
        let tools = parse_tools(value)?;

        let mut state = self.state.write().await;
        if state.selected.as_ref().is_some_and(|e| e.id == endpoint.id) {
            state.tools = tools.clone();
        }
        Ok(tools)
    }

    /// Lists the resources advertised by the connected server.
    pub async fn list_resources(&self) -> Result<Vec<Resource>, Error> {
        let endpoint = self.connected_endpoint().await?;
        let value = self
            .dispatcher
            .call(&endpoint, "resources/list", None)
            .await?;
        let result: ListResourcesResult = parse_payload(value)?;
        Ok(result.resources)
    }

    /// Invokes a tool by name, forwarding the result exactly as the remote
    /// tool produced it, tool-level `isError` flag included.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, Error> {
        let endpoint = self.connected_endpoint().await?;
        tracing::debug!(%name, ?arguments, "Calling tool");

        let params = json!({"name": name, "arguments": arguments});
        let value = self
            .dispatcher
            .call(&endpoint, "tools/call", Some(params))
            .await?;
        parse_payload(value)
    }

    /// Clears the session and tool cache without contacting the server.
    pub async fn reset(&self) {
        {
            let mut state = self.state.write().await;
            state.phase = ConnectionPhase::Disconnected;
            state.tools.clear();
        }
        self.dispatcher.session().reset().await;
        tracing::info!("Connection state reset");
    }

    /// Resets, then reconnects.
    ///
    /// The reset is unconditional and always reported done; a reconnect
    /// failure is carried separately rather than folded into one outcome.
    pub async fn reinitialize(&self) -> ReinitializeReport {
        self.reset().await;
        match self.connect().await {
            Ok(tools) => ReinitializeReport {
                reconnected: true,
                tools,
                error: None,
            },
            Err(error) => ReinitializeReport {
                reconnected: false,
                tools: Vec::new(),
                error: Some(error),
            },
        }
    }

    /// Reports the current state, probing a connected server with `ping`.
    ///
    /// Never fails: a probe failure is folded into the report. A `Remote`
    /// error reply (e.g. `ping` unimplemented) still proves the server is
    /// reachable and counts as connected.
    pub async fn status(&self) -> StatusReport {
        let (phase, selected) = {
            let state = self.state.read().await;
            (state.phase, state.selected.clone())
        };
        let server_id = selected.as_ref().map(|e| e.id.clone());
        let session_id = self.dispatcher.session().session_id().await;

        let mut report = StatusReport {
            connected: false,
            phase,
            server_id,
            session_id,
            error: None,
        };

        let endpoint = match selected {
            Some(endpoint) if phase == ConnectionPhase::Connected => endpoint,
            _ => return report,
        };

        let probe = timeout(
            self.connect_budget,
            self.dispatcher.call(&endpoint, "ping", None),
        )
        .await;

        match probe {
            Ok(Ok(_)) => report.connected = true,
            Ok(Err(Error::Protocol(ProtocolError::Remote { .. }))) => report.connected = true,
            Ok(Err(error)) => report.error = Some(error.to_string()),
            Err(_) => report.error = Some("status probe timed out".to_string()),
        }
        report
    }

    /// Installs a connect outcome unless the caller switched servers while
    /// the request was in flight.
    async fn settle(&self, endpoint: &Endpoint, phase: ConnectionPhase, tools: Option<Vec<Tool>>) {
        let mut state = self.state.write().await;
        if !state.selected.as_ref().is_some_and(|e| e.id == endpoint.id) {
            tracing::debug!(server = %endpoint.id, "Discarding connect outcome for a stale selection");
            return;
        }
        state.phase = phase;
        if let Some(tools) = tools {
            state.tools = tools;
        }
    }

    async fn connected_endpoint(&self) -> Result<Endpoint, Error> {
        let state = self.state.read().await;
        if state.phase != ConnectionPhase::Connected {
            return Err(Error::NotConnected);
        }
        state.selected.clone().ok_or(Error::NoServerSelected)
    }
}

fn parse_tools(value: Value) -> Result<Vec<Tool>, Error> {
    let result: ListToolsResult = parse_payload(value)?;
    Ok(result.tools)
}

fn parse_payload<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::MalformedJson(e.to_string()).into())
}
