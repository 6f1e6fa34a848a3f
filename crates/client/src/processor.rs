//! WebSocket receive loop.
//!
//! Reads frames from a live connection and hands each text frame to the
//! caller until the server closes, the transport fails, or the session
//! is cancelled. The client is receive-only: nothing is sent except the
//! close handshake on cancellation.

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::{FeedSocketError, FeedStream};

/// Why a receive loop stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// The session was cancelled locally; the socket was closed by us.
    Cancelled,
    /// The server closed the connection or the stream ended.
    Closed,
    /// The transport failed mid-session.
    Failed(FeedSocketError),
}

/// Pump frames from `ws_stream` into `on_text` until the session ends.
///
/// Binary frames are ignored. Ping/pong is answered by tungstenite.
pub async fn process_messages<F>(
    ws_stream: &mut FeedStream,
    cancel: &CancellationToken,
    mut on_text: F,
) -> SessionEnd
where
    F: FnMut(&str),
{
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => None,
            next = ws_stream.next() => Some(next),
        };

        let Some(msg_result) = received else {
            if let Err(e) = ws_stream.close(None).await {
                tracing::debug!(error = %e, "Close handshake failed during teardown");
            }
            return SessionEnd::Cancelled;
        };

        match msg_result {
            Some(Ok(Message::Text(text))) => on_text(text.as_str()),
            Some(Ok(Message::Binary(data))) => {
                tracing::trace!(len = data.len(), "Ignoring binary frame");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Server closed WebSocket");
                // Flush the queued close reply.
                if let Err(e) = ws_stream.close(None).await {
                    tracing::debug!(error = %e, "Close reply not flushed");
                }
                return SessionEnd::Closed;
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(e)) => return SessionEnd::Failed(e.into()),
            None => {
                tracing::info!("WebSocket stream exhausted");
                return SessionEnd::Closed;
            }
        }
    }
}
