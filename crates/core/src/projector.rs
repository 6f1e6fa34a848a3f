//! Observable feed state and the fold that updates it.
//!
//! [`FeedState::apply`] folds one [`ResolvedEvent`] into the state:
//! the event always becomes `last_message`, and a `MODEL_READY` event
//! with a resolved URL prepends a [`ModelRecord`]. Connection status is
//! written only by the connection state machine.

use std::collections::VecDeque;

use serde::Serialize;

use crate::messages::ResolvedEvent;
use crate::types::{generate_record_id, ConnectionStatus, ModelRecord};

/// Snapshot of everything a UI observes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub status: ConnectionStatus,
    /// Ready models, newest first. Duplicate ids are kept.
    pub models: VecDeque<ModelRecord>,
    pub last_message: Option<ResolvedEvent>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `event` into the state, returning the record it produced.
    pub fn apply(&mut self, event: ResolvedEvent) -> Option<ModelRecord> {
        let record = model_record_for(&event);
        if let Some(record) = &record {
            self.models.push_front(record.clone());
        }
        self.last_message = Some(event);
        record
    }

    /// Pure form of [`apply`](Self::apply).
    pub fn project(mut self, event: ResolvedEvent) -> Self {
        self.apply(event);
        self
    }
}

/// Build the record for a `MODEL_READY` event with a resolved URL.
///
/// The id prefers `jobId`, then `prompt`, then a generated token.
pub fn model_record_for(event: &ResolvedEvent) -> Option<ModelRecord> {
    if !event.is_model_ready() {
        return None;
    }
    let url = event.model_url()?;

    let server_event = event.event();
    let id = server_event
        .job_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| server_event.prompt.clone().filter(|p| !p.is_empty()))
        .unwrap_or_else(generate_record_id);

    Some(ModelRecord {
        id,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::messages::normalize_frame;

    fn resolved(json: &str) -> ResolvedEvent {
        let config = FeedConfig::new("https://api.example.com").unwrap();
        normalize_frame(&config, json).unwrap()
    }

    #[test]
    fn model_ready_prepends_record() {
        let mut state = FeedState::new();
        state.apply(resolved(r#"{"type":"MODEL_READY","path":"/a.glb","jobId":"first"}"#));
        let record =
            state.apply(resolved(r#"{"type":"MODEL_READY","path":"/b.glb","jobId":"second"}"#));

        assert_eq!(record.map(|r| r.id).as_deref(), Some("second"));
        assert_eq!(state.models.len(), 2);
        assert_eq!(state.models[0].id, "second");
        assert_eq!(state.models[0].url, "https://api.example.com/b.glb");
        assert_eq!(state.models[1].id, "first");
    }

    #[test]
    fn id_prefers_job_id_then_prompt() {
        let with_job = resolved(r#"{"type":"MODEL_READY","path":"/a.glb","jobId":"j1","prompt":"cat"}"#);
        assert_eq!(model_record_for(&with_job).unwrap().id, "j1");

        let prompt_only = resolved(r#"{"type":"MODEL_READY","path":"/a.glb","prompt":"cat"}"#);
        assert_eq!(model_record_for(&prompt_only).unwrap().id, "cat");
    }

    #[test]
    fn id_is_generated_without_job_or_prompt() {
        let bare = resolved(r#"{"type":"MODEL_READY","path":"/a.glb"}"#);
        let first = model_record_for(&bare).unwrap();
        let second = model_record_for(&bare).unwrap();
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let mut state = FeedState::new();
        let event = resolved(r#"{"type":"MODEL_READY","path":"/a.glb","jobId":"same"}"#);
        state.apply(event.clone());
        state.apply(event);
        assert_eq!(state.models.len(), 2);
        assert!(state.models.iter().all(|m| m.id == "same"));
    }

    #[test]
    fn other_type_only_updates_last_message() {
        let mut state = FeedState::new();
        let event = resolved(r#"{"type":"JOB_QUEUED","jobId":"j9","path":"/x.glb"}"#);

        assert!(state.apply(event.clone()).is_none());
        assert!(state.models.is_empty());
        assert_eq!(state.last_message, Some(event));
    }

    #[test]
    fn numeric_job_id_still_produces_record() {
        let mut state = FeedState::new();
        let record = state.apply(resolved(r#"{"type":"MODEL_READY","path":"/a.glb","jobId":42}"#));
        assert_eq!(record.map(|r| r.id).as_deref(), Some("42"));
        assert_eq!(state.models.len(), 1);
    }

    #[test]
    fn untyped_frame_updates_last_message_only() {
        let mut state = FeedState::new();
        let event = resolved(r#"{"path":"/a.glb","progress":1}"#);

        assert!(state.apply(event.clone()).is_none());
        assert!(state.models.is_empty());
        assert_eq!(state.last_message, Some(event));
    }

    #[test]
    fn model_ready_without_url_is_dropped() {
        let mut state = FeedState::new();
        let event = resolved(r#"{"type":"MODEL_READY","jobId":"j1"}"#);

        assert!(state.apply(event.clone()).is_none());
        assert!(state.models.is_empty());
        assert_eq!(state.last_message, Some(event));
    }

    #[test]
    fn apply_never_touches_status() {
        let state = FeedState {
            status: ConnectionStatus::Connected,
            ..FeedState::default()
        };
        let next = state.project(resolved(r#"{"type":"MODEL_READY","path":"/a.glb"}"#));
        assert_eq!(next.status, ConnectionStatus::Connected);
        assert_eq!(next.models.len(), 1);
    }
}
