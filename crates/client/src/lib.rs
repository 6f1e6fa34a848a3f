//! Auto-reconnecting WebSocket client for the generation-job feed.
//!
//! Connects to the generation server, normalizes every inbound frame,
//! folds it into an observable [`FeedState`](genfeed_core::FeedState)
//! and broadcasts [`FeedEvent`](events::FeedEvent)s. Start with
//! [`FeedClient`](manager::FeedClient).

pub mod client;
pub mod events;
pub mod manager;
pub mod processor;
pub mod reconnect;

pub use events::FeedEvent;
pub use manager::{FeedClient, FeedClientError};
