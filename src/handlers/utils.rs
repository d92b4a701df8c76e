use axum::http::{header, HeaderMap};
use serde_json::{Map, Value};

/// Decode a POST body as JSON or as an url-encoded form
pub fn parse_document_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields: Map<String, Value> = url::form_urlencoded::parse(body)
            .into_owned()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        return Ok(Value::Object(fields));
    }

    if content_type.starts_with("application/json") || content_type.ends_with("+json") {
        return serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e));
    }

    Err(format!("unsupported content type '{}'", content_type))
}
