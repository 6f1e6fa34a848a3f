//! Events broadcast by the feed client.
//!
//! The [`FeedState`](genfeed_core::FeedState) watch channel only shows
//! the latest snapshot; these events carry every transition, including
//! the short-lived `error` status that a snapshot observer can miss.

use genfeed_core::{ConnectionStatus, ModelRecord, ResolvedEvent};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    /// The connection state machine moved to a new status.
    StatusChanged { status: ConnectionStatus },

    /// A frame was decoded and applied; it is now the last message.
    MessageReceived { event: ResolvedEvent },

    /// A `MODEL_READY` frame produced a new record at the head of the list.
    ModelReady { record: ModelRecord },
}
