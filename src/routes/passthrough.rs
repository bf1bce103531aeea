use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Uri, header},
    response::Response,
};
use std::sync::Arc;
use url::Url;

use super::build_response;
use super::headers::forwardable_headers;
use crate::AppState;
use crate::error::ProxyError;

/// Forward any unmatched request unmodified and relay the response as-is.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let url = target_url(&parts.uri, &parts.headers, state.passthrough_url.as_ref())?;
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::ReadBody(e.to_string()))?;

    tracing::debug!(method = %parts.method, url = %url, "Passing request through");

    let response = state
        .http_client
        .request(parts.method, url)
        .headers(forwardable_headers(&parts.headers))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let headers = forwardable_headers(response.headers());
    Ok(build_response(
        status,
        headers,
        Body::from_stream(response.bytes_stream()),
    ))
}

/// Where an unmatched request goes.
///
/// Priority: the configured passthrough base (path and query replaced), the
/// absolute request URI, then `http://<Host>` with the request's path and query.
pub fn target_url(uri: &Uri, headers: &HeaderMap, base: Option<&Url>) -> Result<Url, ProxyError> {
    if let Some(base) = base {
        return Ok(with_path_and_query(base.clone(), uri));
    }

    if uri.authority().is_some() {
        return Ok(Url::parse(&uri.to_string())?);
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ProxyError::InvalidUrl("request names no target host".to_string()))?;

    let origin = Url::parse(&format!("http://{host}"))?;
    Ok(with_path_and_query(origin, uri))
}

fn with_path_and_query(mut url: Url, uri: &Uri) -> Url {
    url.set_path(uri.path());
    url.set_query(uri.query());
    url
}
