use std::time::Duration;

/// Default upstream base URL for translated chat completions
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.sensenova.cn";

/// Inbound path that triggers translation (exact, case-sensitive)
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Upstream route the translated request is sent to
pub const UPSTREAM_CHAT_PATH: &str = "/v1/llm/chat-completions";

/// Default listen address (all interfaces, port 8089)
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8089;

/// `object` tag of every streamed client chunk
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// Fixed `system_fingerprint` identifying this proxy
pub const SYSTEM_FINGERPRINT: &str = "cf-openai-sensechat-proxy-123";

/// SSE terminal sentinel payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Encoded SSE terminal frame, passed through verbatim
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Minted tokens become valid this many seconds before `now` (clock skew allowance)
pub const TOKEN_NOT_BEFORE_SKEW_SECS: i64 = 5;

/// Minted tokens expire this many seconds after `now`
pub const TOKEN_TTL_SECS: i64 = 120;

/// Default keep-alive interval for re-framed SSE streams
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// SSE keep-alive comment (ignored by clients but keeps connection alive).
pub const KEEP_ALIVE_COMMENT: &str = ": keep-alive\n\n";

/// Longest upstream SSE line accepted before the stream is abandoned
pub const MAX_SSE_LINE_BYTES: usize = 64 * 1024;
