use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors that abort a proxied call before any response bytes are sent.
///
/// Fail-open paths (unparseable credentials, undecodable SSE events) are not
/// represented here: they never surface to the client.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to read request body: {0}")]
    ReadBody(String),

    #[error("Failed to modify request body: {0}")]
    InvalidBody(String),

    #[error("Failed to parse URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to forward request: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::ReadBody(_) | ProxyError::InvalidBody(_) | ProxyError::InvalidUrl(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        ProxyError::InvalidBody(e.to_string())
    }
}

impl From<url::ParseError> for ProxyError {
    fn from(e: url::ParseError) -> Self {
        ProxyError::InvalidUrl(e.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), "{self}");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors_are_internal() {
        assert_eq!(
            ProxyError::InvalidBody("eof".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::InvalidUrl("no host".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_error_becomes_invalid_body() {
        let err: ProxyError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ProxyError::InvalidBody(_)));
        assert!(err.to_string().starts_with("Failed to modify request body"));
    }
}
