//! SSE re-framing from the upstream chunk schema to `chat.completion.chunk`.
//!
//! [`SseReframer`] holds all per-stream state (partial line, partial event,
//! captured model) and is created once per response, so concurrent streams
//! never share a buffer. [`reframe_stream`] drives it over an upstream body
//! and yields one `Bytes` per completed event, which hyper writes and
//! flushes as its own chunk.

use std::time::Duration;

use async_stream::stream;
use bytes::Bytes;
use futures_util::Stream;
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, warn};

use super::events::{ClientEvent, UpstreamEvent, UpstreamUsage};
use crate::auth::unix_now;
use crate::constants::{DONE_FRAME, DONE_SENTINEL, KEEP_ALIVE_COMMENT, MAX_SSE_LINE_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReframeError {
    #[error("Upstream SSE line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// Incremental upstream-to-client SSE translator for a single stream.
#[derive(Debug)]
pub struct SseReframer {
    model: String,
    /// Bytes of the current line, not yet terminated by `\n`
    line: Vec<u8>,
    /// Lines of the current event, not yet terminated by a blank line
    event: String,
    finished: bool,
    error: Option<ReframeError>,
    usage: Option<UpstreamUsage>,
}

impl SseReframer {
    /// `model` is the client's requested model, echoed in every chunk.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            line: Vec::new(),
            event: String::new(),
            finished: false,
            error: None,
            usage: None,
        }
    }

    /// True once the `[DONE]` sentinel has been emitted. Further input is ignored.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The failure that stopped re-framing, if any. Further input is ignored
    /// once set.
    pub fn error(&self) -> Option<&ReframeError> {
        self.error.as_ref()
    }

    fn stopped(&self) -> bool {
        self.finished || self.error.is_some()
    }

    /// Last usage figures reported by the upstream, if any
    pub fn last_usage(&self) -> Option<UpstreamUsage> {
        self.usage
    }

    /// Feed raw body bytes, returning the encoded output of every event this
    /// chunk completes. Chunk boundaries may fall anywhere, including inside
    /// a UTF-8 sequence.
    ///
    /// A line longer than [`MAX_SSE_LINE_BYTES`] stops re-framing with
    /// [`ReframeError::LineTooLong`]; frames completed before it are still returned.
    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();

        while !self.stopped() {
            let newline_pos = chunk.iter().position(|&b| b == b'\n');
            let segment = &chunk[..newline_pos.unwrap_or(chunk.len())];

            if self.line.len() + segment.len() > MAX_SSE_LINE_BYTES {
                self.line.clear();
                self.error = Some(ReframeError::LineTooLong(MAX_SSE_LINE_BYTES));
                break;
            }
            self.line.extend_from_slice(segment);

            let Some(newline_pos) = newline_pos else {
                break;
            };
            chunk = &chunk[newline_pos + 1..];

            let mut line = std::mem::take(&mut self.line);
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if let Some(frame) = self.push_line(&String::from_utf8_lossy(&line)) {
                frames.push(Bytes::from(frame));
            }
        }

        frames
    }

    /// Append one line (without its terminator). A blank line completes the
    /// buffered event, which is translated and returned unless it produced
    /// no output.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if self.stopped() {
            return None;
        }

        self.event.push_str(line);
        self.event.push('\n');
        if !line.is_empty() {
            return None;
        }

        let event = std::mem::take(&mut self.event);
        let frame = self.transform_event(&event);
        (!frame.is_empty()).then_some(frame)
    }

    fn transform_event(&mut self, event: &str) -> String {
        let mut output = String::new();

        for line in event.split('\n') {
            let Some(rest) = line.strip_prefix("data:") else {
                // Comments, `event:`, `retry:` and friends keep their framing
                if !line.is_empty() {
                    output.push_str(line);
                    output.push_str("\n\n");
                }
                continue;
            };

            let data = rest.trim();
            if data == DONE_SENTINEL {
                output.push_str(DONE_FRAME);
                self.finished = true;
                break;
            }

            if let Some(chunk) = self.translate(data) {
                output.push_str("data: ");
                output.push_str(&chunk);
                output.push_str("\n\n");
            }
        }

        output
    }

    /// Decode one upstream payload and encode its client chunk.
    /// Undecodable payloads are dropped so that one bad event cannot end the stream.
    fn translate(&mut self, data: &str) -> Option<String> {
        let event: UpstreamEvent = match serde_json::from_str(data) {
            Ok(e) => e,
            Err(e) => {
                debug!("Dropping undecodable upstream event: {e}");
                return None;
            }
        };

        if let Some(status) = &event.status
            && status.code != 0
        {
            warn!(
                code = status.code,
                "Upstream reported error status: {}", status.message
            );
        }

        if let Some(usage) = event.data.usage {
            self.usage = Some(usage);
        }

        let chunk = ClientEvent::from_upstream(event.data, &self.model, unix_now());
        serde_json::to_string(&chunk)
            .inspect_err(|e| debug!("Failed to encode client chunk: {e}"))
            .ok()
    }
}

/// Frame sent when the upstream stream fails mid-way.
fn error_frame(message: &str) -> String {
    let body = serde_json::json!({
        "error": {
            "message": message,
            "type": "upstream_stream_error"
        }
    });
    format!("data: {}\n\n", body)
}

async fn tick(keep_alive: &mut Option<Interval>) {
    match keep_alive {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Re-frame an upstream SSE body into client chunks.
///
/// Ends when the upstream closes or after `[DONE]`. A transport error or an
/// oversized line yields an `upstream_stream_error` frame and then an I/O error, which aborts the
/// response body rather than ending it cleanly. If the client goes away the
/// response body is dropped, and with it this stream and the upstream body.
///
/// With `keep_alive` set, a comment is sent whenever the upstream has been
/// silent for that long.
pub fn reframe_stream<S, E>(
    body: S,
    model: String,
    keep_alive: Option<Duration>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    stream! {
        use futures_util::StreamExt;

        let mut reframer = SseReframer::new(model);
        let mut body = std::pin::pin!(body);
        let mut keep_alive =
            keep_alive.map(|period| interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                biased; // Prefer data over keep-alive when both ready

                chunk_opt = body.next() => {
                    let Some(chunk_result) = chunk_opt else {
                        break; // Upstream closed
                    };

                    let chunk = match chunk_result {
                        Ok(c) => c,
                        Err(e) => {
                            warn!("Upstream stream failed: {e}");
                            yield Ok(Bytes::from(error_frame(&e.to_string())));
                            yield Err(std::io::Error::other(e));
                            return;
                        }
                    };

                    for frame in reframer.feed(&chunk) {
                        yield Ok(frame);
                    }

                    if let Some(e) = reframer.error().cloned() {
                        warn!("Stopping re-framing: {e}");
                        yield Ok(Bytes::from(error_frame(&e.to_string())));
                        yield Err(std::io::Error::other(e));
                        return;
                    }

                    if reframer.is_finished() {
                        break;
                    }

                    if let Some(timer) = keep_alive.as_mut() {
                        timer.reset();
                    }
                }

                _ = tick(&mut keep_alive) => {
                    yield Ok(Bytes::from_static(KEEP_ALIVE_COMMENT.as_bytes()));
                }
            }
        }

        if let Some(usage) = reframer.last_usage() {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                knowledge_tokens = usage.knowledge_tokens,
                total_tokens = usage.total_tokens,
                "Upstream stream finished"
            );
        }
    }
}
