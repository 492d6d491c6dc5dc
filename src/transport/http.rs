use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::{Error, ProtocolError};
use crate::protocol::{Notification, Request, Response};
use crate::registry::{AuthScheme, Endpoint};
use crate::transport::decode;
use crate::SESSION_ID_HEADER;

/// A decoded JSON-RPC reply plus the transport-level session identifier the
/// server attached to it, if any.
#[derive(Debug)]
pub struct RpcReply {
    pub envelope: Response,
    pub session_id: Option<String>,
}

/// HTTP POST transport for JSON-RPC envelopes.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(request_timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { http })
    }

    /// Sends a request envelope and decodes the reply.
    ///
    /// A non-success status is reported before the body is looked at; the
    /// session header is captured either way so the negotiator can adopt it.
    pub async fn request(
        &self,
        endpoint: &Endpoint,
        session_id: Option<&str>,
        request: &Request,
    ) -> Result<RpcReply, Error> {
        tracing::debug!(url = %endpoint.url, method = %request.method, "Sending MCP request");

        let response = self
            .http
            .post(&endpoint.url)
            .headers(build_headers(endpoint, session_id))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let reply_session = header_value(response.headers(), SESSION_ID_HEADER);

        if !status.is_success() {
            tracing::warn!(%status, method = %request.method, "MCP request rejected");
            return Err(ProtocolError::Transport {
                status: status.as_u16(),
            }
            .into());
        }

        let content_type = header_value(response.headers(), CONTENT_TYPE.as_str())
            .unwrap_or_default();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let envelope = decode(&body, &content_type)?;
        tracing::trace!(?envelope, "Decoded MCP response");

        Ok(RpcReply {
            envelope,
            session_id: reply_session,
        })
    }

    /// Sends a notification envelope and reports the HTTP status.
    ///
    /// The response body, if any, is not read; notifications expect none.
    pub async fn notify(
        &self,
        endpoint: &Endpoint,
        session_id: Option<&str>,
        notification: &Notification,
    ) -> Result<StatusCode, Error> {
        tracing::debug!(url = %endpoint.url, method = %notification.method, "Sending MCP notification");

        let response = self
            .http
            .post(&endpoint.url)
            .headers(build_headers(endpoint, session_id))
            .json(notification)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(response.status())
    }
}

/// Assembles the header set for one call: content negotiation, the endpoint's
/// static auth header, and the session identifier once one is known.
///
/// Invalid header values are skipped rather than panicking.
fn build_headers(endpoint: &Endpoint, session_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/event-stream"),
    );

    if let Some(auth) = &endpoint.auth {
        let entry = match &auth.scheme {
            AuthScheme::Bearer => Some((
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", auth.secret)),
            )),
            AuthScheme::Basic => Some((
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Basic {}", BASE64.encode(&auth.secret))),
            )),
            AuthScheme::Custom(name) => HeaderName::from_bytes(name.as_bytes())
                .ok()
                .map(|name| (name, HeaderValue::from_str(&auth.secret))),
        };
        match entry {
            Some((name, Ok(value))) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(server = %endpoint.id, "Skipping unencodable auth header"),
        }
    }

    if let Some(sid) = session_id {
        if let Ok(value) = HeaderValue::from_str(sid) {
            headers.insert(SESSION_ID_HEADER, value);
        }
    }

    headers
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AuthCredential;

    fn endpoint_with(auth: Option<AuthCredential>) -> Endpoint {
        Endpoint {
            id: "test".to_string(),
            display_name: "Test".to_string(),
            url: "http://127.0.0.1:1/mcp".to_string(),
            auth,
            is_builtin: true,
            is_default: false,
        }
    }

    #[test]
    fn headers_always_negotiate_both_formats() {
        let headers = build_headers(&endpoint_with(None), None);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json, text/event-stream");
        assert!(headers.get(SESSION_ID_HEADER).is_none());
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_auth_builds_authorization_header() {
        let endpoint = endpoint_with(Some(AuthCredential {
            scheme: AuthScheme::Bearer,
            secret: "tok-123".to_string(),
        }));
        let headers = build_headers(&endpoint, None);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok-123");
    }

    #[test]
    fn basic_auth_is_base64_encoded() {
        let endpoint = endpoint_with(Some(AuthCredential {
            scheme: AuthScheme::Basic,
            secret: "user:pass".to_string(),
        }));
        let headers = build_headers(&endpoint, None);
        assert_eq!(headers[AUTHORIZATION], "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn custom_auth_uses_the_configured_header_name() {
        let endpoint = endpoint_with(Some(AuthCredential {
            scheme: AuthScheme::Custom("x-api-key".to_string()),
            secret: "secret".to_string(),
        }));
        let headers = build_headers(&endpoint, None);
        assert_eq!(headers["x-api-key"], "secret");
    }

    #[test]
    fn session_id_is_attached_once_known() {
        let headers = build_headers(&endpoint_with(None), Some("abc123"));
        assert_eq!(headers[SESSION_ID_HEADER], "abc123");
    }
}
