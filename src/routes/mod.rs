pub mod chat;
pub mod headers;
pub mod passthrough;

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode},
    response::Response,
};

/// Assemble a relayed response from upstream status, headers and body
pub(crate) fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
