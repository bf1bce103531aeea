use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// Headers that describe a single connection (or are recomputed by the
/// client library) and must not be copied from one leg to the other.
fn is_connection_specific(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-connection"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}

/// Copy every header (all values, in order) except connection-specific ones
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_connection_specific(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Whether the request body should be treated as JSON
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

/// Whether an upstream response is an SSE stream (exact match, no parameters)
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        == Some("text/event-stream")
}

/// Set `Access-Control-Allow-Origin` on every response to the value the
/// inbound request carried in that same header, or `*`.
///
/// This is an echo, not origin negotiation.
pub async fn echo_allow_origin(request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    response
}
