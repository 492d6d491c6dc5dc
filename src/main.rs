use anyhow::Result;
use mcp_http_client::client::ClientBuilder;
use mcp_http_client::registry::{AuthScheme, Endpoint};
use tracing_subscriber::EnvFilter;

/// Connection smoke test: negotiate a session against the server named by
/// `MCP_SERVER_URL` (optionally authenticated via `MCP_SERVER_TOKEN`), list
/// its tools, and print a status line.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::var("MCP_SERVER_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3333/mcp".to_string());

    let mut endpoint = Endpoint::builtin("smoke", "Smoke-test server", &url).default_server();
    if let Ok(token) = std::env::var("MCP_SERVER_TOKEN") {
        endpoint = endpoint.with_auth(AuthScheme::Bearer, &token);
    }

    eprintln!("Connecting to MCP server at {url}");

    let client = ClientBuilder::new()
        .server(endpoint)
        .select_default()
        .build()?;

    match client.connect().await {
        Ok(tools) => {
            eprintln!("Connected, {} tool(s) advertised:", tools.len());
            for tool in &tools {
                eprintln!("  - {}: {}", tool.name, tool.description);
            }
        }
        Err(e) => {
            eprintln!("Connection failed: {e}");
            return Err(e.into());
        }
    }

    let report = client.status().await;
    eprintln!(
        "Status: connected={} session={}",
        report.connected,
        report.session_id.as_deref().unwrap_or("<none>")
    );

    Ok(())
}
