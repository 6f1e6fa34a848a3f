//! Runtime-free domain logic for the generation-job feed.
//!
//! - [`config`] -- validated server origin and derived WebSocket endpoint.
//! - [`messages`] -- server frame types and the frame normalizer.
//! - [`resolve`] -- asset path to absolute URL resolution.
//! - [`projector`] -- observable [`FeedState`](projector::FeedState) and its fold.
//! - [`connection`] -- the connection lifecycle state machine.

pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
pub mod projector;
pub mod resolve;
pub mod types;

pub use config::FeedConfig;
pub use connection::{ConnectionCommand, ConnectionMachine};
pub use error::{FeedConfigError, NormalizeError};
pub use messages::{normalize_frame, ResolvedEvent, ServerEvent, MODEL_READY};
pub use projector::FeedState;
pub use types::{ConnectionStatus, ModelRecord};
