//! Upstream and client chunk schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CHUNK_OBJECT, SYSTEM_FINGERPRINT};

// ============================================================================
// Upstream chunk
// ============================================================================

/// One decoded upstream SSE data payload.
#[derive(Debug, Default, Deserialize)]
pub struct UpstreamEvent {
    #[serde(default)]
    pub data: UpstreamData,
    pub status: Option<UpstreamStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamData {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
    pub usage: Option<UpstreamUsage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamChoice {
    #[serde(default)]
    pub index: u32,
    /// Text delta
    pub delta: Option<String>,
    pub reasoning_content: Option<String>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UpstreamUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub knowledge_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Client chunk
// ============================================================================

/// One outbound `chat.completion.chunk` payload.
#[derive(Debug, Serialize)]
pub struct ClientEvent {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub system_fingerprint: &'static str,
    pub choices: Vec<ClientChoice>,
}

#[derive(Debug, Serialize)]
pub struct ClientChoice {
    pub index: u32,
    pub delta: ClientDelta,
    pub logprobs: Option<Value>,
    pub finish_reason: Option<String>,
}

/// Serializes to `{}` when both fields are absent
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClientDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

impl From<UpstreamChoice> for ClientChoice {
    fn from(choice: UpstreamChoice) -> Self {
        Self {
            index: choice.index,
            delta: ClientDelta {
                content: non_empty(choice.delta),
                reasoning_content: non_empty(choice.reasoning_content),
            },
            logprobs: None,
            finish_reason: non_empty(choice.finish_reason),
        }
    }
}

impl ClientEvent {
    /// Build the client chunk for one upstream event.
    ///
    /// `model` is the model the client asked for; `created` is the current
    /// time, not anything the upstream reported.
    pub fn from_upstream(data: UpstreamData, model: &str, created: i64) -> Self {
        Self {
            id: data.id.unwrap_or_default(),
            object: CHUNK_OBJECT,
            created,
            model: model.to_string(),
            system_fingerprint: SYSTEM_FINGERPRINT,
            choices: data.choices.into_iter().map(ClientChoice::from).collect(),
        }
    }
}
