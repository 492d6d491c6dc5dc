//! Server-list configuration loading and environment overrides.
//!
//! The built-in server set is supplied externally as a JSON document and can
//! be adjusted per deployment through environment variables:
//! `MCP_<ID>_URL` replaces a server's URL and `MCP_<ID>_TOKEN` supplies or
//! replaces its credential, where `<ID>` is the server id uppercased with
//! dashes mapped to underscores.

use serde::Deserialize;

use crate::error::Error;
use crate::registry::{AuthCredential, AuthScheme, Endpoint};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AuthKind {
    Bearer,
    Basic,
    Custom,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    scheme: AuthKind,
    /// Header name, required for the `custom` scheme.
    #[serde(default)]
    header: Option<String>,
    /// Static credential; may be omitted and supplied via `MCP_<ID>_TOKEN`.
    #[serde(default)]
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    id: String,
    name: String,
    url: String,
    #[serde(default)]
    auth: Option<AuthEntry>,
    #[serde(default)]
    default: bool,
}

/// The externally supplied list of built-in MCP servers.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub(crate) servers: Vec<ServerEntry>,
}

impl Config {
    /// Loads the server list from a JSON file.
    pub fn load_config(path: &str) -> Result<Config, Error> {
        let data =
            std::fs::read_to_string(path).map_err(|e| Error::Config(format!("{path}: {e}")))?;
        let config: Config =
            serde_json::from_str(&data).map_err(|e| Error::Config(format!("{path}: {e}")))?;
        Ok(config)
    }

    /// Parses the server list from a JSON string.
    pub fn from_json(data: &str) -> Result<Config, Error> {
        serde_json::from_str(data).map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolves the configured servers into endpoint descriptors, applying
    /// environment overrides for URL and credential.
    pub fn into_endpoints(self) -> Result<Vec<Endpoint>, Error> {
        self.servers.into_iter().map(resolve_entry).collect()
    }
}

fn resolve_entry(entry: ServerEntry) -> Result<Endpoint, Error> {
    let env_prefix = format!(
        "MCP_{}",
        entry.id.to_uppercase().replace('-', "_")
    );
    let url = std::env::var(format!("{env_prefix}_URL")).unwrap_or(entry.url);
    let env_secret = std::env::var(format!("{env_prefix}_TOKEN")).ok();

    let auth = match entry.auth {
        None => None,
        Some(auth) => {
            let secret = env_secret.or(auth.secret).ok_or_else(|| {
                Error::Config(format!(
                    "server '{}' requires auth but no secret is configured (set {env_prefix}_TOKEN)",
                    entry.id
                ))
            })?;
            let scheme = match auth.scheme {
                AuthKind::Bearer => AuthScheme::Bearer,
                AuthKind::Basic => AuthScheme::Basic,
                AuthKind::Custom => {
                    let header = auth.header.ok_or_else(|| {
                        Error::Config(format!(
                            "server '{}' uses a custom auth scheme but names no header",
                            entry.id
                        ))
                    })?;
                    AuthScheme::Custom(header)
                }
            };
            Some(AuthCredential { scheme, secret })
        }
    };

    Ok(Endpoint {
        id: entry.id,
        display_name: entry.name,
        url,
        auth,
        is_builtin: true,
        is_default: entry.default,
    })
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_config() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("servers.json");
        let mut file = File::create(&config_path).unwrap();
        let json = r#"
        {
            "servers": [
                {
                    "id": "devops",
                    "name": "DevOps MCP Server",
                    "url": "http://127.0.0.1:3000/api/devops-mcp",
                    "default": true
                },
                {
                    "id": "gitlab",
                    "name": "GitLab MCP",
                    "url": "http://127.0.0.1:3333/mcp",
                    "auth": {"scheme": "bearer", "secret": "glpat-test"}
                }
            ]
        }
        "#;
        file.write_all(json.as_bytes()).unwrap();

        let endpoints = Config::load_config(config_path.to_str().unwrap())
            .unwrap()
            .into_endpoints()
            .unwrap();

        assert_eq!(endpoints.len(), 2);
        assert!(endpoints[0].is_default);
        assert!(endpoints[0].auth.is_none());
        let auth = endpoints[1].auth.as_ref().unwrap();
        assert_eq!(auth.scheme, AuthScheme::Bearer);
        assert_eq!(auth.secret, "glpat-test");
    }

    #[test]
    fn env_variables_override_url_and_secret() {
        // Unique id so parallel tests cannot observe each other's vars.
        let json = r#"
        {
            "servers": [
                {
                    "id": "env-override-case",
                    "name": "Overridden",
                    "url": "http://127.0.0.1:1/mcp",
                    "auth": {"scheme": "bearer"}
                }
            ]
        }
        "#;
        std::env::set_var("MCP_ENV_OVERRIDE_CASE_URL", "http://10.0.0.5:8080/mcp");
        std::env::set_var("MCP_ENV_OVERRIDE_CASE_TOKEN", "from-env");

        let endpoints = Config::from_json(json).unwrap().into_endpoints().unwrap();

        assert_eq!(endpoints[0].url, "http://10.0.0.5:8080/mcp");
        assert_eq!(endpoints[0].auth.as_ref().unwrap().secret, "from-env");

        std::env::remove_var("MCP_ENV_OVERRIDE_CASE_URL");
        std::env::remove_var("MCP_ENV_OVERRIDE_CASE_TOKEN");
    }

    #[test]
    fn auth_without_any_secret_is_rejected() {
        let json = r#"
        {
            "servers": [
                {
                    "id": "no-secret-anywhere",
                    "name": "Broken",
                    "url": "http://127.0.0.1:1/mcp",
                    "auth": {"scheme": "bearer"}
                }
            ]
        }
        "#;
        let err = Config::from_json(json)
            .unwrap()
            .into_endpoints()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn custom_scheme_requires_a_header_name() {
        let json = r#"
        {
            "servers": [
                {
                    "id": "headerless",
                    "name": "Broken",
                    "url": "http://127.0.0.1:1/mcp",
                    "auth": {"scheme": "custom", "secret": "k"}
                }
            ]
        }
        "#;
        let err = Config::from_json(json)
            .unwrap()
            .into_endpoints()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
