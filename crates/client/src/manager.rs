//! Feed connection manager.
//!
//! [`FeedClient`] keeps a persistent WebSocket connection to the
//! generation server. Lifecycle decisions are made by a
//! [`ConnectionMachine`]; this module carries out the commands it
//! returns: spawning the socket task, closing it, and arming or
//! disarming the single reconnect timer.
//!
//! Observers read state through a [`tokio::sync::watch`] snapshot
//! ([`FeedClient::subscribe_state`]) or receive every change as a
//! [`FeedEvent`] ([`FeedClient::subscribe`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use genfeed_core::{
    normalize_frame, ConnectionCommand, ConnectionMachine, ConnectionStatus, FeedConfig,
    FeedState, ModelRecord, ResolvedEvent,
};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::client::open_socket;
use crate::events::FeedEvent;
use crate::processor::{process_messages, SessionEnd};
use crate::reconnect::ReconnectTimer;

/// Broadcast channel capacity for feed events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Auto-reconnecting client for the generation-job feed.
///
/// Dropping the client disconnects it.
pub struct FeedClient {
    shared: Arc<Shared>,
}

struct Shared {
    config: FeedConfig,
    endpoint: String,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<FeedState>,
    event_tx: broadcast::Sender<FeedEvent>,
}

struct Inner {
    machine: ConnectionMachine,
    /// Runtime captured by the last `connect()`; tasks are spawned on it.
    runtime: Option<Handle>,
    /// Bumped for every socket task; callbacks from older tasks are ignored.
    socket_generation: u64,
    /// Cancels the current socket task when dropped.
    socket: Option<DropGuard>,
    /// Bumped for every armed timer.
    timer_generation: u64,
    reconnect_timer: Option<ReconnectTimer>,
}

impl FeedClient {
    /// Create a disconnected client. Call [`connect`](Self::connect) to start.
    pub fn new(config: FeedConfig) -> Self {
        let (state_tx, _) = watch::channel(FeedState::new());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let machine = ConnectionMachine::new(config.reconnect_delay());

        Self {
            shared: Arc::new(Shared {
                endpoint: config.endpoint().as_str().to_string(),
                config,
                inner: Mutex::new(Inner {
                    machine,
                    runtime: None,
                    socket_generation: 0,
                    socket: None,
                    timer_generation: 0,
                    reconnect_timer: None,
                }),
                state_tx,
                event_tx,
            }),
        }
    }

    /// Start (or restart) the connection loop.
    ///
    /// Must be called from within a tokio runtime. Any live socket or
    /// pending reconnect is replaced.
    pub fn connect(&self) -> Result<(), FeedClientError> {
        let runtime = Handle::try_current().map_err(|_| FeedClientError::NoRuntime)?;

        let mut inner = self.shared.lock();
        inner.runtime = Some(runtime);
        tracing::info!(endpoint = %self.shared.endpoint, "Connecting to generation server");
        let commands = inner.machine.connect();
        self.shared.execute(&mut inner, commands);
        Ok(())
    }

    /// Close the connection and cancel any pending reconnect.
    ///
    /// Calling this more than once has no further effect.
    pub fn disconnect(&self) {
        let mut inner = self.shared.lock();
        let commands = inner.machine.disconnect();
        if !commands.is_empty() {
            tracing::info!(endpoint = %self.shared.endpoint, "Disconnecting from generation server");
        }
        self.shared.execute(&mut inner, commands);
    }

    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.state_tx.borrow().status
    }

    /// Current snapshot of status, models and last message.
    pub fn state(&self) -> FeedState {
        self.shared.state_tx.borrow().clone()
    }

    /// Ready models, newest first.
    pub fn models(&self) -> Vec<ModelRecord> {
        self.shared.state_tx.borrow().models.iter().cloned().collect()
    }

    pub fn last_message(&self) -> Option<ResolvedEvent> {
        self.shared.state_tx.borrow().last_message.clone()
    }

    /// Watch the state snapshot.
    pub fn subscribe_state(&self) -> watch::Receiver<FeedState> {
        self.shared.state_tx.subscribe()
    }

    /// Receive every status transition, applied message and new model.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.event_tx.subscribe()
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Carry out state machine commands, then publish the resulting status.
    fn execute<I>(self: &Arc<Self>, inner: &mut Inner, commands: I)
    where
        I: IntoIterator<Item = ConnectionCommand>,
    {
        for command in commands {
            match command {
                ConnectionCommand::Open => self.spawn_socket(inner),
                ConnectionCommand::Close => {
                    inner.socket.take();
                }
                ConnectionCommand::ScheduleReconnect(delay) => self.arm_reconnect(inner, delay),
                ConnectionCommand::CancelReconnect => {
                    if inner.reconnect_timer.take().is_some() {
                        tracing::debug!("Pending reconnect cancelled");
                    }
                }
            }
        }
        self.publish_status(inner.machine.status());
    }

    fn spawn_socket(self: &Arc<Self>, inner: &mut Inner) {
        let Some(runtime) = inner.runtime.clone() else {
            tracing::error!("No runtime captured, cannot open socket");
            return;
        };

        inner.socket_generation += 1;
        let generation = inner.socket_generation;
        let cancel = CancellationToken::new();
        inner.socket = Some(cancel.clone().drop_guard());

        runtime.spawn(run_socket(Arc::clone(self), generation, cancel));
    }

    fn arm_reconnect(self: &Arc<Self>, inner: &mut Inner, delay: std::time::Duration) {
        let Some(runtime) = inner.runtime.clone() else {
            tracing::error!("No runtime captured, cannot schedule reconnect");
            return;
        };

        // Disarm before replacing so two timers never coexist.
        inner.reconnect_timer.take();
        inner.timer_generation += 1;
        let timer_generation = inner.timer_generation;

        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            "Disconnected from generation server, retrying after delay",
        );

        let shared = Arc::clone(self);
        inner.reconnect_timer = Some(ReconnectTimer::spawn(&runtime, delay, move || {
            shared.on_reconnect_timer(timer_generation);
        }));
    }

    fn publish_status(&self, status: ConnectionStatus) {
        let changed = self.state_tx.send_if_modified(|state| {
            if state.status == status {
                false
            } else {
                state.status = status;
                true
            }
        });
        if changed {
            tracing::debug!(%status, "Connection status changed");
            let _ = self.event_tx.send(FeedEvent::StatusChanged { status });
        }
    }

    // ---- transport callbacks ----

    fn on_open(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.socket_generation != generation {
            return;
        }
        if inner.machine.opened() {
            tracing::info!(endpoint = %self.endpoint, "Feed connected");
            self.publish_status(inner.machine.status());
        }
    }

    fn on_transport_error(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.socket_generation != generation {
            return;
        }
        let command = inner.machine.errored();
        self.execute(&mut inner, command);
    }

    fn on_closed(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.socket_generation != generation {
            return;
        }
        let command = inner.machine.closed();
        self.execute(&mut inner, command);
    }

    fn on_reconnect_timer(self: &Arc<Self>, timer_generation: u64) {
        let mut inner = self.lock();
        if inner.timer_generation != timer_generation || inner.reconnect_timer.is_none() {
            return;
        }
        inner.reconnect_timer = None;
        tracing::info!(endpoint = %self.endpoint, "Reconnecting to generation server");
        let command = inner.machine.reconnect_fired();
        self.execute(&mut inner, command);
    }

    fn on_frame(&self, generation: u64, text: &str) {
        let resolved = match normalize_frame(&self.config, text) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Failed to parse feed message");
                return;
            }
        };

        let inner = self.lock();
        if inner.socket_generation != generation || !inner.machine.is_socket_live() {
            return;
        }

        let mut record = None;
        self.state_tx.send_modify(|state| {
            record = state.apply(resolved.clone());
        });

        tracing::debug!(
            kind = resolved.kind(),
            model_url = ?resolved.model_url(),
            "Applied feed message",
        );
        let _ = self.event_tx.send(FeedEvent::MessageReceived { event: resolved });

        if let Some(record) = record {
            tracing::info!(id = %record.id, url = %record.url, "Model ready");
            let _ = self.event_tx.send(FeedEvent::ModelReady { record });
        }
        drop(inner);
    }
}

/// One socket lifetime: handshake, receive loop, and the close/error
/// callbacks that drive the state machine.
async fn run_socket(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = open_socket(&shared.endpoint) => result,
    };

    let mut ws_stream = match connected {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            tracing::warn!(generation, error = %e, "Connection attempt failed");
            shared.on_transport_error(generation);
            shared.on_closed(generation);
            return;
        }
    };

    shared.on_open(generation);

    let end = process_messages(&mut ws_stream, &cancel, |text| {
        shared.on_frame(generation, text);
    })
    .await;

    match end {
        SessionEnd::Cancelled => {
            tracing::debug!(generation, "Socket task cancelled");
        }
        SessionEnd::Closed => shared.on_closed(generation),
        SessionEnd::Failed(e) => {
            tracing::warn!(generation, error = %e, "Connection failed");
            shared.on_transport_error(generation);
            shared.on_closed(generation);
        }
    }
}

/// Errors returned by [`FeedClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedClientError {
    /// `connect()` was called outside a tokio runtime.
    #[error("connect() must be called from within a tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn client() -> FeedClient {
        FeedClient::new(FeedConfig::new("http://127.0.0.1:9").unwrap())
    }

    #[test]
    fn connect_outside_runtime_fails() {
        assert_matches!(client().connect(), Err(FeedClientError::NoRuntime));
    }

    #[test]
    fn new_client_starts_empty() {
        let client = client();
        assert_eq!(client.status(), ConnectionStatus::Connecting);
        assert!(client.models().is_empty());
        assert!(client.last_message().is_none());
    }

    #[test]
    fn disconnect_before_connect_is_harmless() {
        let client = client();
        client.disconnect();
        client.disconnect();
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn frames_from_stale_socket_are_ignored() {
        let client = client();
        client
            .shared
            .on_frame(42, r#"{"type":"MODEL_READY","path":"/a.glb","jobId":"j1"}"#);
        assert!(client.models().is_empty());
        assert!(client.last_message().is_none());
    }
}
