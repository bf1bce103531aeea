//! Request body rewrite for the upstream chat route.
//!
//! The three recognized sampling fields are lifted out of the JSON object
//! into typed slots. Everything else rides along untouched in `extra`.

use serde_json::{Map, Value};

use crate::error::ProxyError;

/// Lower bound substituted for `top_p <= 0`
pub const TOP_P_MIN: f64 = 0.000001;
/// Upper bound substituted for `top_p >= 1`
pub const TOP_P_MAX: f64 = 0.999999;

/// A client chat request body in the inbound dialect.
///
/// Each recognized field keeps its raw JSON value (any type) so that
/// non-numeric inputs follow the same pass/drop rules as the wire format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundChatRequest {
    pub max_tokens: Option<Value>,
    pub frequency_penalty: Option<Value>,
    pub top_p: Option<Value>,
    /// Unrecognized keys, `model` included
    pub extra: Map<String, Value>,
}

/// The same body in the upstream dialect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamChatRequest {
    /// Renamed from `max_tokens`, value carried over whatever its type
    pub max_new_tokens: Option<Value>,
    pub repetition_penalty: Option<f64>,
    pub top_p: Option<Value>,
    pub extra: Map<String, Value>,
}

impl InboundChatRequest {
    /// Parse a JSON body. Anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProxyError> {
        let map: Map<String, Value> = serde_json::from_slice(body)?;
        Ok(Self::from_map(map))
    }

    pub fn from_map(mut extra: Map<String, Value>) -> Self {
        Self {
            max_tokens: extra.remove("max_tokens"),
            frequency_penalty: extra.remove("frequency_penalty"),
            top_p: extra.remove("top_p"),
            extra,
        }
    }

    /// Model name, when the client sent one as a string
    pub fn model(&self) -> Option<&str> {
        self.extra.get("model").and_then(Value::as_str)
    }

    pub fn into_upstream(self) -> UpstreamChatRequest {
        UpstreamChatRequest {
            max_new_tokens: self.max_tokens,
            repetition_penalty: self
                .frequency_penalty
                .as_ref()
                .and_then(repetition_penalty),
            top_p: self.top_p.map(clamp_top_p),
            extra: self.extra,
        }
    }
}

impl UpstreamChatRequest {
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = self.extra;
        if let Some(v) = self.max_new_tokens {
            map.insert("max_new_tokens".to_string(), v);
        }
        if let Some(p) = self.repetition_penalty {
            map.insert("repetition_penalty".to_string(), Value::from(p));
        }
        if let Some(v) = self.top_p {
            map.insert("top_p".to_string(), v);
        }
        map
    }

    pub fn to_vec(self) -> Result<Vec<u8>, ProxyError> {
        Ok(serde_json::to_vec(&self.into_map())?)
    }
}

/// `(frequency_penalty + 2) / 2` for numeric input.
///
/// Non-numeric input yields `None`: the field is dropped without a
/// substitute.
pub fn repetition_penalty(frequency_penalty: &Value) -> Option<f64> {
    frequency_penalty.as_f64().map(|f| (f + 2.0) / 2.0)
}

/// Keep numeric `top_p` inside the open interval (0, 1). Non-numeric values pass through.
pub fn clamp_top_p(top_p: Value) -> Value {
    match top_p.as_f64() {
        Some(p) if p <= 0.0 => Value::from(TOP_P_MIN),
        Some(p) if p >= 1.0 => Value::from(TOP_P_MAX),
        _ => top_p,
    }
}

/// Rewrite a JSON request body into the upstream dialect.
///
/// Returns the re-encoded body and the client's model name (empty when absent).
pub fn transform_request_body(body: &[u8]) -> Result<(Vec<u8>, String), ProxyError> {
    let request = InboundChatRequest::from_slice(body)?;
    let model = request.model().unwrap_or_default().to_string();
    let encoded = request.into_upstream().to_vec()?;
    Ok((encoded, model))
}

/// Best-effort model name from an already-encoded body (non-JSON bodies give "")
pub fn model_of(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("model").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transform(body: Value) -> Value {
        let (encoded, _) = transform_request_body(body.to_string().as_bytes()).unwrap();
        serde_json::from_slice(&encoded).unwrap()
    }

    #[test]
    fn test_max_tokens_renamed() {
        let out = transform(json!({"max_tokens": 512}));
        assert_eq!(out["max_new_tokens"], 512);
        assert!(out.get("max_tokens").is_none());

        // Any type moves across, null included
        let out = transform(json!({"max_tokens": "many"}));
        assert_eq!(out["max_new_tokens"], "many");
        let out = transform(json!({"max_tokens": null}));
        assert_eq!(out.get("max_new_tokens"), Some(&Value::Null));
        assert!(out.get("max_tokens").is_none());
    }

    #[test]
    fn test_frequency_penalty_becomes_repetition_penalty() {
        let out = transform(json!({"frequency_penalty": 0.5}));
        assert_eq!(out["repetition_penalty"], 1.25);
        assert!(out.get("frequency_penalty").is_none());

        let out = transform(json!({"frequency_penalty": -2}));
        assert_eq!(out["repetition_penalty"], 0.0);

        let out = transform(json!({"frequency_penalty": 2}));
        assert_eq!(out["repetition_penalty"], 2.0);
    }

    #[test]
    fn test_non_numeric_frequency_penalty_is_dropped() {
        let out = transform(json!({"frequency_penalty": "high", "model": "m"}));
        assert!(out.get("frequency_penalty").is_none());
        assert!(out.get("repetition_penalty").is_none());
        assert_eq!(out["model"], "m");
    }

    #[test]
    fn test_top_p_clamped_to_open_interval() {
        assert_eq!(transform(json!({"top_p": -1}))["top_p"], 0.000001);
        assert_eq!(transform(json!({"top_p": 0}))["top_p"], 0.000001);
        assert_eq!(transform(json!({"top_p": 1}))["top_p"], 0.999999);
        assert_eq!(transform(json!({"top_p": 2}))["top_p"], 0.999999);
        assert_eq!(transform(json!({"top_p": 0.5}))["top_p"], 0.5);
        assert_eq!(transform(json!({"top_p": "auto"}))["top_p"], "auto");
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let out = transform(json!({
            "model": "SenseChat-5",
            "stream": true,
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.7
        }));
        assert_eq!(out["model"], "SenseChat-5");
        assert_eq!(out["stream"], true);
        assert_eq!(out["messages"][0]["content"], "hi");
        assert_eq!(out["temperature"], 0.7);
        assert_eq!(out.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_model_captured() {
        let (_, model) =
            transform_request_body(br#"{"model":"SenseChat-Turbo","max_tokens":1}"#).unwrap();
        assert_eq!(model, "SenseChat-Turbo");

        let (_, model) = transform_request_body(br#"{"model":42}"#).unwrap();
        assert_eq!(model, "");
    }

    #[test]
    fn test_malformed_body_rejected() {
        assert!(matches!(
            transform_request_body(b"{not json"),
            Err(ProxyError::InvalidBody(_))
        ));
        assert!(transform_request_body(b"").is_err());
        assert!(transform_request_body(b"[1, 2]").is_err());
    }

    #[test]
    fn test_typed_rules_independent() {
        let request = InboundChatRequest::from_map(
            json!({"top_p": 3, "x": 1}).as_object().unwrap().clone(),
        );
        let upstream = request.into_upstream();
        assert_eq!(upstream.max_new_tokens, None);
        assert_eq!(upstream.repetition_penalty, None);
        assert_eq!(upstream.top_p, Some(json!(0.999999)));
        assert_eq!(upstream.extra.get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_model_of() {
        assert_eq!(model_of(br#"{"model":"a"}"#), "a");
        assert_eq!(model_of(b"plain text"), "");
    }
}
