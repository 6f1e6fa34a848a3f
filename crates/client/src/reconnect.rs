//! Fixed-delay reconnect timer.
//!
//! After a close, the manager arms exactly one [`ReconnectTimer`]. When
//! it fires, the callback asks the state machine to reconnect. Dropping
//! or cancelling the timer disarms it, so a timer can only be replaced
//! after it has been cancelled or has fired.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle to an armed reconnect timer. Disarmed on drop.
pub struct ReconnectTimer {
    _guard: DropGuard,
}

impl ReconnectTimer {
    /// Arm a timer on `runtime` that calls `on_fire` after `delay`.
    pub fn spawn<F>(runtime: &Handle, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Reconnect timer cancelled");
                }
                _ = tokio::time::sleep(delay) => on_fire(),
            }
        });

        Self {
            _guard: cancel.drop_guard(),
        }
    }

    /// Disarm the timer. Equivalent to dropping it.
    pub fn cancel(self) {}
}
