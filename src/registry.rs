//! Endpoint descriptors and the server registry.
//!
//! The registry combines a fixed built-in set, supplied by configuration,
//! with a custom set added and removed at runtime. Ids are unique across
//! both sets; built-in entries can never be removed.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How an endpoint's static auth header is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `Authorization: Basic <base64(secret)>`, secret given as `user:password`
    Basic,
    /// `<header-name>: <secret>`
    Custom(String),
}

/// A credential paired with the scheme used to send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    pub scheme: AuthScheme,
    pub secret: String,
}

/// Describes one reachable MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Unique, stable identifier across built-in and custom entries.
    pub id: String,
    pub display_name: String,
    pub url: String,
    /// `None` when the endpoint needs no authentication.
    pub auth: Option<AuthCredential>,
    pub is_builtin: bool,
    pub is_default: bool,
}

impl Endpoint {
    /// Convenience constructor for an unauthenticated built-in endpoint.
    pub fn builtin(id: &str, display_name: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            url: url.to_string(),
            auth: None,
            is_builtin: true,
            is_default: false,
        }
    }

    /// Convenience constructor for an unauthenticated custom endpoint.
    pub fn custom(id: &str, display_name: &str, url: &str) -> Self {
        Self {
            is_builtin: false,
            ..Self::builtin(id, display_name, url)
        }
    }

    /// Marks this endpoint as the registry default.
    pub fn default_server(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Attaches an auth credential.
    pub fn with_auth(mut self, scheme: AuthScheme, secret: &str) -> Self {
        self.auth = Some(AuthCredential {
            scheme,
            secret: secret.to_string(),
        });
        self
    }
}

/// Mapping from server id to endpoint descriptor.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    builtin: Vec<Endpoint>,
    custom: Vec<Endpoint>,
}

impl ServerRegistry {
    /// Creates a registry over the configured built-in set.
    ///
    /// The built-in flag is forced on every entry so a mislabeled descriptor
    /// cannot make a configured server removable.
    pub fn new(builtin: Vec<Endpoint>) -> Self {
        let builtin = builtin
            .into_iter()
            .map(|mut endpoint| {
                endpoint.is_builtin = true;
                endpoint
            })
            .collect();
        Self {
            builtin,
            custom: Vec::new(),
        }
    }

    /// Looks up an endpoint by id.
    pub fn resolve(&self, id: &str) -> Result<&Endpoint, Error> {
        self.iter()
            .find(|endpoint| endpoint.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// All entries, built-ins first, each set in insertion order.
    pub fn list_all(&self) -> Vec<&Endpoint> {
        self.iter().collect()
    }

    /// Appends a custom endpoint.
    ///
    /// The entry is stored with the built-in and default flags cleared: the
    /// default can only ever be a configured built-in, which keeps the
    /// at-most-one-default invariant intact.
    pub fn add(&mut self, mut endpoint: Endpoint) -> Result<(), Error> {
        if self.iter().any(|existing| existing.id == endpoint.id) {
            return Err(Error::Conflict(endpoint.id));
        }
        endpoint.is_builtin = false;
        endpoint.is_default = false;
        tracing::debug!(server = %endpoint.id, "Registered custom MCP server");
        self.custom.push(endpoint);
        Ok(())
    }

    /// Removes a custom endpoint, returning its descriptor.
    pub fn remove(&mut self, id: &str) -> Result<Endpoint, Error> {
        if self.builtin.iter().any(|endpoint| endpoint.id == id) {
            return Err(Error::Policy(id.to_string()));
        }
        let position = self
            .custom
            .iter()
            .position(|endpoint| endpoint.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        tracing::debug!(server = %id, "Removed custom MCP server");
        Ok(self.custom.remove(position))
    }

    /// The entry flagged default, or the first built-in when none is flagged.
    pub fn default_endpoint(&self) -> Option<&Endpoint> {
        self.builtin
            .iter()
            .find(|endpoint| endpoint.is_default)
            .or_else(|| self.builtin.first())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty() && self.custom.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.builtin.iter().chain(self.custom.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ServerRegistry {
        ServerRegistry::new(vec![
            Endpoint::builtin("gitlab", "GitLab MCP", "http://127.0.0.1:3333/mcp"),
            Endpoint::builtin("devops", "DevOps MCP", "http://127.0.0.1:4444/mcp").default_server(),
        ])
    }

    #[test]
    fn resolve_finds_builtin_and_custom_entries() {
        let mut registry = registry();
        registry
            .add(Endpoint::custom("local", "Local", "http://127.0.0.1:9/mcp"))
            .unwrap();

        assert_eq!(registry.resolve("gitlab").unwrap().display_name, "GitLab MCP");
        assert_eq!(registry.resolve("local").unwrap().display_name, "Local");
        assert!(matches!(registry.resolve("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn list_all_orders_builtins_before_custom() {
        let mut registry = registry();
        registry
            .add(Endpoint::custom("zzz", "Z", "http://127.0.0.1:9/mcp"))
            .unwrap();

        let ids: Vec<&str> = registry.list_all().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["gitlab", "devops", "zzz"]);
    }

    #[test]
    fn duplicate_add_is_a_conflict_and_leaves_size_unchanged() {
        let mut registry = registry();
        registry
            .add(Endpoint::custom("x", "X", "http://127.0.0.1:9/mcp"))
            .unwrap();
        let before = registry.len();

        let err = registry
            .add(Endpoint::custom("x", "X again", "http://127.0.0.1:10/mcp"))
            .unwrap_err();
        assert_eq!(err, Error::Conflict("x".to_string()));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn add_colliding_with_builtin_id_is_a_conflict() {
        let mut registry = registry();
        let err = registry
            .add(Endpoint::custom("gitlab", "Impostor", "http://127.0.0.1:9/mcp"))
            .unwrap_err();
        assert_eq!(err, Error::Conflict("gitlab".to_string()));
    }

    #[test]
    fn removing_a_builtin_is_a_policy_error_and_mutates_nothing() {
        let mut registry = registry();
        let before = registry.len();

        let err = registry.remove("gitlab").unwrap_err();
        assert_eq!(err, Error::Policy("gitlab".to_string()));
        assert_eq!(registry.len(), before);
        assert!(registry.resolve("gitlab").is_ok());
    }

    #[test]
    fn removing_an_unknown_id_is_not_found() {
        let mut registry = registry();
        assert!(matches!(registry.remove("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn default_prefers_the_flagged_entry() {
        let registry = registry();
        assert_eq!(registry.default_endpoint().unwrap().id, "devops");
    }

    #[test]
    fn default_falls_back_to_first_builtin() {
        let registry = ServerRegistry::new(vec![
            Endpoint::builtin("a", "A", "http://127.0.0.1:1/mcp"),
            Endpoint::builtin("b", "B", "http://127.0.0.1:2/mcp"),
        ]);
        assert_eq!(registry.default_endpoint().unwrap().id, "a");
    }

    #[test]
    fn custom_entries_never_become_default_or_builtin() {
        let mut registry = ServerRegistry::new(vec![]);
        registry
            .add(
                Endpoint::custom("only", "Only", "http://127.0.0.1:9/mcp").default_server(),
            )
            .unwrap();

        let entry = registry.resolve("only").unwrap();
        assert!(!entry.is_default);
        assert!(!entry.is_builtin);
        assert!(registry.default_endpoint().is_none());
    }
}
