//! Request/response transformations between the client and upstream dialects.
//!
//! This module provides:
//! - `request`: chat request body rewrite (field renames, value clamping)
//! - `events`: upstream and client SSE chunk schemas
//! - `streaming`: SSE re-framing from upstream chunks to client chunks

pub mod events;
pub mod request;
pub mod streaming;

// Re-export commonly used items
pub use events::{ClientEvent, UpstreamEvent};
pub use request::{InboundChatRequest, UpstreamChatRequest, model_of, transform_request_body};
pub use streaming::{ReframeError, SseReframer, reframe_stream};
