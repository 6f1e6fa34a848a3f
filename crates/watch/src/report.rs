//! Feed event reporting loop.
//!
//! Connects the client, logs every [`FeedEvent`], and writes each ready
//! model to stdout as one JSON line until shutdown is requested.

use std::future::Future;

use anyhow::Context;
use genfeed_client::{FeedClient, FeedEvent};
use tokio::sync::broadcast::error::RecvError;

/// Run the watcher until `shutdown` resolves, then disconnect.
pub async fn run<S>(client: &FeedClient, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()>,
{
    let mut events = client.subscribe();
    client.connect().context("Failed to start feed client")?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            received = events.recv() => match received {
                Ok(event) => {
                    log_event(&event);
                    if let Some(line) = render_event(&event)? {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Feed event receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect();
    let state = client.state();
    tracing::info!(
        models = state.models.len(),
        status = %state.status,
        "Feed watcher stopped",
    );
    Ok(())
}

fn log_event(event: &FeedEvent) {
    match event {
        FeedEvent::StatusChanged { status } => {
            tracing::info!(%status, "Connection status");
        }
        FeedEvent::MessageReceived { event } => {
            tracing::debug!(
                kind = event.kind(),
                model_url = ?event.model_url(),
                "Feed message",
            );
        }
        FeedEvent::ModelReady { record } => {
            tracing::info!(id = %record.id, url = %record.url, "Model ready");
        }
    }
}

/// Stdout line for an event: ready models only, as JSON.
pub fn render_event(event: &FeedEvent) -> anyhow::Result<Option<String>> {
    match event {
        FeedEvent::ModelReady { record } => Ok(Some(serde_json::to_string(record)?)),
        _ => Ok(None),
    }
}
