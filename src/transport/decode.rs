use crate::error::ProtocolError;
use crate::protocol::Response;

/// The two body formats an MCP endpoint answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    EventStream,
}

impl ResponseFormat {
    /// Picks the decode branch from the declared content type.
    ///
    /// Matching is by substring so parameterized values such as
    /// `text/event-stream; charset=utf-8` resolve correctly.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("text/event-stream") {
            ResponseFormat::EventStream
        } else {
            ResponseFormat::Json
        }
    }
}

/// Extracts a single JSON-RPC envelope from a raw response body.
///
/// For an event stream the first `data: `-prefixed line carries the envelope;
/// everything else (`event:`, `id:`, comments, blank lines) is framing. A
/// stream without a data line is malformed.
pub fn decode(body: &str, content_type: &str) -> Result<Response, ProtocolError> {
    let payload = match ResponseFormat::from_content_type(content_type) {
        ResponseFormat::EventStream => body
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .ok_or(ProtocolError::MalformedStream)?,
        ResponseFormat::Json => body,
    };

    serde_json::from_str(payload).map_err(|e| ProtocolError::MalformedJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ENVELOPE: &str = r#"{"jsonrpc":"2.0","id":0,"result":{"ok":true}}"#;

    #[test]
    fn format_is_sniffed_from_content_type() {
        assert_eq!(
            ResponseFormat::from_content_type("application/json"),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::from_content_type("text/event-stream"),
            ResponseFormat::EventStream
        );
        assert_eq!(
            ResponseFormat::from_content_type("text/event-stream; charset=utf-8"),
            ResponseFormat::EventStream
        );
    }

    #[test]
    fn json_and_sse_bodies_decode_to_identical_envelopes() {
        let sse_body = format!("event: message\ndata: {ENVELOPE}\n\n");

        let from_json = decode(ENVELOPE, "application/json").unwrap();
        let from_sse = decode(&sse_body, "text/event-stream").unwrap();

        assert_eq!(from_json.result, from_sse.result);
        assert_eq!(from_json.id, from_sse.id);
        assert_eq!(from_json.result, Some(json!({"ok": true})));
    }

    #[test]
    fn sse_decode_skips_leading_framing_lines() {
        let body = format!(": keep-alive\nid: 3\nevent: message\ndata: {ENVELOPE}\n");
        let response = decode(&body, "text/event-stream").unwrap();
        assert!(response.result.is_some());
    }

    #[test]
    fn sse_without_data_line_is_malformed_stream() {
        let err = decode("event: message\n\n", "text/event-stream").unwrap_err();
        assert_eq!(err, ProtocolError::MalformedStream);
    }

    #[test]
    fn unparseable_json_body_is_malformed_json() {
        let err = decode("<html>bad gateway</html>", "application/json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedJson(_)));
    }

    #[test]
    fn unparseable_sse_payload_is_malformed_json() {
        let err = decode("data: {not json}\n", "text/event-stream").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedJson(_)));
    }

    #[test]
    fn envelope_with_error_object_survives_decode() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#;
        let response = decode(body, "application/json").unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found");
    }
}
