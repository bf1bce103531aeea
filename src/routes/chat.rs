use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::build_response;
use super::headers::{forwardable_headers, is_event_stream, is_json};
use crate::AppState;
use crate::auth::{SplitCredential, mint_token, unix_now};
use crate::constants::UPSTREAM_CHAT_PATH;
use crate::error::ProxyError;
use crate::transforms::{model_of, reframe_stream, transform_request_body};

/// Translate a client chat completion call into the upstream dialect.
///
/// The body is rewritten when it is JSON, the split credential (if any) is
/// exchanged for a freshly minted token, and an SSE response is re-framed
/// into client chunks. Other responses are copied through byte for byte.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let raw = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::ReadBody(e.to_string()))?;

    let (outbound, model) = if is_json(&parts.headers) {
        let (body, model) = transform_request_body(&raw)?;
        (Bytes::from(body), model)
    } else {
        let model = model_of(&raw);
        (raw, model)
    };

    let mut url = state.upstream_url.clone();
    url.set_path(UPSTREAM_CHAT_PATH);

    let mut headers = forwardable_headers(&parts.headers);
    // The re-framer reads the upstream body as plain text
    headers.remove(header::ACCEPT_ENCODING);
    let minted = match minted_authorization(&parts.headers) {
        Some(value) => {
            headers.insert(header::AUTHORIZATION, value);
            true
        }
        None => false,
    };

    debug!(model = %model, minted, method = %parts.method, "Forwarding chat completion upstream");

    let response = state
        .http_client
        .request(parts.method, url)
        .headers(headers)
        .body(outbound)
        .send()
        .await?;

    Ok(relay_chat_response(response, model, state.keep_alive))
}

/// Authorization value carrying a token minted from the inbound split credential.
///
/// `None` means the original header (if any) is forwarded unchanged.
fn minted_authorization(inbound: &HeaderMap) -> Option<HeaderValue> {
    let Some(credential) = SplitCredential::from_headers(inbound) else {
        if inbound.contains_key(header::AUTHORIZATION) {
            debug!("Authorization is not a split credential, forwarding as-is");
        }
        return None;
    };

    let token = match mint_token(&credential, unix_now()) {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to mint upstream token, forwarding original Authorization: {e}");
            return None;
        }
    };

    HeaderValue::from_str(&format!("Bearer {token}"))
        .inspect_err(|e| warn!("Minted token is not a valid header value: {e}"))
        .ok()
}

fn relay_chat_response(
    response: reqwest::Response,
    model: String,
    keep_alive: Option<Duration>,
) -> Response {
    let status = response.status();
    let mut headers = forwardable_headers(response.headers());

    if !is_event_stream(response.headers()) {
        return build_response(status, headers, Body::from_stream(response.bytes_stream()));
    }

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    let sse_stream = reframe_stream(response.bytes_stream(), model, keep_alive);
    build_response(status, headers, Body::from_stream(sse_stream))
}
