//! WebSocket transport for the generation server.
//!
//! [`open_socket`] performs the handshake against the endpoint derived
//! from the configured origin. There is no handshake timeout; a stalled
//! connect is ended by the transport's own error or by cancellation.

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A live WebSocket connection to the generation server.
pub type FeedStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connect to `endpoint` (e.g. `wss://api.example.com/`).
pub async fn open_socket(endpoint: &str) -> Result<FeedStream, FeedSocketError> {
    let (ws_stream, _response) = connect_async(endpoint)
        .await
        .map_err(|e| FeedSocketError::Connection(format!("Failed to connect to {endpoint}: {e}")))?;

    tracing::info!(endpoint, "Connected to generation server");
    Ok(ws_stream)
}

/// Transport-level failures. These never escape the client: they drive
/// the reconnect loop and are logged.
#[derive(Debug, thiserror::Error)]
pub enum FeedSocketError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(#[from] tokio_tungstenite::tungstenite::Error),
}
