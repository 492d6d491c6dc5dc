use std::time::Duration;

use crate::client::McpClient;
use crate::config::Config;
use crate::error::Error;
use crate::registry::{Endpoint, ServerRegistry};
use crate::rpc::Dispatcher;
use crate::session::Session;
use crate::transport::HttpTransport;
use crate::types::Implementation;

/// Fixed budget for a whole `connect` attempt, handshake included.
pub const DEFAULT_CONNECT_BUDGET: Duration = Duration::from_secs(10);

/// Per-request timeout applied by the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A builder for creating an [`McpClient`] over a set of built-in servers.
pub struct ClientBuilder {
    /// Built-in endpoint descriptors, usually loaded from configuration.
    servers: Vec<Endpoint>,
    /// Optional client identity (name, version) announced during handshake.
    identity: Option<Implementation>,
    connect_budget: Option<Duration>,
    request_timeout: Option<Duration>,
    select_default: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        tracing::debug!("Creating new ClientBuilder");
        Self {
            servers: Vec::new(),
            identity: None,
            connect_budget: None,
            request_timeout: None,
            select_default: false,
        }
    }

    /// Adds one built-in server.
    pub fn server(mut self, endpoint: Endpoint) -> Self {
        tracing::trace!(server = %endpoint.id, "Adding server to ClientBuilder");
        self.servers.push(endpoint);
        self
    }

    /// Adds several built-in servers.
    pub fn servers<I>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = Endpoint>,
    {
        self.servers.extend(endpoints);
        self
    }

    /// Loads the built-in server set from a parsed configuration, applying
    /// environment overrides.
    pub fn from_config(self, config: Config) -> Result<Self, Error> {
        let endpoints = config.into_endpoints()?;
        Ok(self.servers(endpoints))
    }

    pub fn identity(mut self, name: &str, version: &str) -> Self {
        tracing::trace!(%name, %version, "Setting identity for ClientBuilder");
        self.identity = Some(Implementation {
            name: name.to_string(),
            version: version.to_string(),
        });
        self
    }

    /// Overrides the fixed budget a `connect` attempt runs under.
    pub fn connect_budget(mut self, budget: Duration) -> Self {
        self.connect_budget = Some(budget);
        self
    }

    /// Overrides the transport's per-request timeout.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    /// Starts with the registry's default server already selected, so the
    /// first call can be `connect()` instead of `switch_server` + `connect`.
    pub fn select_default(mut self) -> Self {
        self.select_default = true;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be constructed.
    pub fn build(self) -> Result<McpClient, Error> {
        let registry = ServerRegistry::new(self.servers);
        let selected = if self.select_default {
            registry.default_endpoint().cloned()
        } else {
            None
        };

        let identity = self.identity.unwrap_or_else(|| {
            let default_identity = Implementation::default();
            tracing::debug!(?default_identity, "Using default identity");
            default_identity
        });

        let transport = HttpTransport::new(
            self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        )?;
        let dispatcher = Dispatcher::new(transport, Session::new(identity));

        Ok(McpClient::new(
            dispatcher,
            registry,
            selected,
            self.connect_budget.unwrap_or(DEFAULT_CONNECT_BUDGET),
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
