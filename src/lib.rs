//! Reverse proxy that makes a SenseNova-style chat upstream speak the
//! OpenAI chat-completions dialect.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod routes;
pub mod transforms;

use axum::{Router, middleware, routing::any};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::Config;
use crate::constants::CHAT_COMPLETIONS_PATH;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");
pub const BUILD_TIME: &str = env!("BUILD_TIME");

/// Shared, read-only handler state. Per-request buffers live in the handlers.
pub struct AppState {
    pub http_client: Client,
    /// Base URL of the translating upstream
    pub upstream_url: Url,
    /// Base URL for unmatched paths; `None` targets the host the request names
    pub passthrough_url: Option<Url>,
    /// Keep-alive comment interval for re-framed streams
    pub keep_alive: Option<Duration>,
}

impl AppState {
    pub fn new(config: &Config, http_client: Client) -> Self {
        Self {
            http_client,
            upstream_url: config.upstream_url.clone(),
            passthrough_url: config.passthrough_url.clone(),
            keep_alive: config.keep_alive,
        }
    }
}

/// Build the proxy router: one translated path, everything else passed through.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CHAT_COMPLETIONS_PATH, any(routes::chat::chat_completions))
        .fallback(routes::passthrough::forward)
        .layer(middleware::from_fn(routes::headers::echo_allow_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
