//! Server frame types and the frame normalizer.
//!
//! The generation server pushes JSON text frames shaped like
//! `{"type": "MODEL_READY", "path": "/files/a.glb", "jobId": "...", "prompt": "..."}`.
//! [`normalize_frame`] decodes one frame and attaches the resolved
//! absolute asset URL, producing a [`ResolvedEvent`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::FeedConfig;
use crate::error::NormalizeError;
use crate::resolve::resolve_model_url;

/// `type` value announcing that a generation job produced an asset.
pub const MODEL_READY: &str = "MODEL_READY";

/// Key the resolved URL is serialized under.
const MODEL_URL_KEY: &str = "modelUrl";

/// A decoded server frame.
///
/// Any JSON object is accepted. A missing or non-string `type` decodes as
/// an empty kind. Numeric or boolean `jobId`/`prompt` values are kept as
/// their text; other shapes count as absent. Fields other than the known
/// ones are kept in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    #[serde(rename = "type", default, deserialize_with = "string_or_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "string_only", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(
        rename = "jobId",
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_only(deserializer)?.unwrap_or_default())
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Ok(None),
    }
}

impl ServerEvent {
    pub fn is_model_ready(&self) -> bool {
        self.kind == MODEL_READY
    }
}

/// A server event plus its resolved asset URL.
///
/// `model_url` is `None` when the frame had no path or the path could not
/// be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEvent {
    #[serde(flatten)]
    event: ServerEvent,
    #[serde(rename = "modelUrl")]
    model_url: Option<String>,
}

impl ResolvedEvent {
    /// Pair `event` with its resolved URL. A `modelUrl` key sent by the
    /// server is discarded in favour of the resolved one.
    pub fn new(mut event: ServerEvent, model_url: Option<String>) -> Self {
        event.extra.remove(MODEL_URL_KEY);
        Self { event, model_url }
    }

    pub fn event(&self) -> &ServerEvent {
        &self.event
    }

    pub fn kind(&self) -> &str {
        &self.event.kind
    }

    pub fn model_url(&self) -> Option<&str> {
        self.model_url.as_deref()
    }

    pub fn is_model_ready(&self) -> bool {
        self.event.is_model_ready()
    }
}

/// Decode a raw text frame into a [`ServerEvent`].
pub fn parse_frame(text: &str) -> Result<ServerEvent, NormalizeError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a frame and resolve its asset path against `config`.
///
/// Resolution runs for every event type, not only `MODEL_READY`.
pub fn normalize_frame(config: &FeedConfig, text: &str) -> Result<ResolvedEvent, NormalizeError> {
    let event = parse_frame(text)?;
    let model_url = resolve_model_url(config, event.path.as_deref());
    Ok(ResolvedEvent::new(event, model_url))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> FeedConfig {
        FeedConfig::new("https://api.example.com").unwrap()
    }

    #[test]
    fn model_ready_frame_resolves_path() {
        let json = r#"{"type":"MODEL_READY","path":"/files/a.glb","jobId":"j1","prompt":"cat"}"#;
        let resolved = normalize_frame(&config(), json).unwrap();
        assert!(resolved.is_model_ready());
        assert_eq!(resolved.event().job_id.as_deref(), Some("j1"));
        assert_eq!(resolved.event().prompt.as_deref(), Some("cat"));
        assert_eq!(resolved.model_url(), Some("https://api.example.com/files/a.glb"));
    }

    #[test]
    fn other_types_still_resolve_path() {
        let json = r#"{"type":"JOB_PROGRESS","path":"http://localhost:8000/preview.png","progress":40}"#;
        let resolved = normalize_frame(&config(), json).unwrap();
        assert!(!resolved.is_model_ready());
        assert_eq!(resolved.kind(), "JOB_PROGRESS");
        assert_eq!(resolved.model_url(), Some("https://api.example.com/preview.png"));
        assert_eq!(resolved.event().extra["progress"], 40);
    }

    #[test]
    fn frame_without_path_has_no_url() {
        let resolved = normalize_frame(&config(), r#"{"type":"MODEL_READY","jobId":"j1"}"#).unwrap();
        assert_eq!(resolved.model_url(), None);
    }

    #[test]
    fn resolved_event_serializes_model_url() {
        let resolved = normalize_frame(&config(), r#"{"type":"MODEL_READY","path":"/a.glb"}"#).unwrap();
        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["type"], "MODEL_READY");
        assert_eq!(value["path"], "/a.glb");
        assert_eq!(value["modelUrl"], "https://api.example.com/a.glb");
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_matches!(parse_frame("not json at all"), Err(NormalizeError::Decode(_)));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(parse_frame(r#"["MODEL_READY"]"#).is_err());
        assert!(parse_frame("42").is_err());
    }

    #[test]
    fn missing_type_decodes_as_unrecognized() {
        let resolved = normalize_frame(&config(), r#"{"path":"/a.glb","progress":1}"#).unwrap();
        assert_eq!(resolved.kind(), "");
        assert!(!resolved.is_model_ready());
        assert_eq!(resolved.model_url(), Some("https://api.example.com/a.glb"));
    }

    #[test]
    fn non_string_type_decodes_as_unrecognized() {
        let event = parse_frame(r#"{"type":7,"jobId":"j1"}"#).unwrap();
        assert_eq!(event.kind, "");
        assert_eq!(event.job_id.as_deref(), Some("j1"));
    }

    #[test]
    fn numeric_job_id_is_stringified() {
        let resolved =
            normalize_frame(&config(), r#"{"type":"MODEL_READY","path":"/a.glb","jobId":42}"#).unwrap();
        assert!(resolved.is_model_ready());
        assert_eq!(resolved.event().job_id.as_deref(), Some("42"));
        assert_eq!(resolved.model_url(), Some("https://api.example.com/a.glb"));
    }

    #[test]
    fn structured_optional_fields_count_as_absent() {
        let event =
            parse_frame(r#"{"type":"MODEL_READY","path":{"p":1},"jobId":null,"prompt":["x"]}"#).unwrap();
        assert_eq!(event.path, None);
        assert_eq!(event.job_id, None);
        assert_eq!(event.prompt, None);
    }

    #[test]
    fn server_model_url_is_not_duplicated() {
        let resolved = normalize_frame(
            &config(),
            r#"{"type":"MODEL_READY","path":"/a.glb","modelUrl":"http://localhost/a.glb"}"#,
        )
        .unwrap();
        assert!(!resolved.event().extra.contains_key("modelUrl"));

        let json = serde_json::to_string(&resolved).unwrap();
        assert_eq!(json.matches("\"modelUrl\"").count(), 1);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["modelUrl"], "https://api.example.com/a.glb");
    }
}
