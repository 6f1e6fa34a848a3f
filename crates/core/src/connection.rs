//! Connection lifecycle state machine.
//!
//! [`ConnectionMachine`] owns the connection status and the bookkeeping
//! that keeps at most one socket and one reconnect timer alive. It does
//! no I/O: every transition returns the [`ConnectionCommand`]s the
//! driver must carry out.
//!
//! ```text
//! connect()          -> connecting          [Open]
//! opened()           connecting -> connected
//! errored()          -> error               [Close]
//! closed()           -> disconnected        [ScheduleReconnect(delay)]
//! reconnect_fired()  -> connecting          [Open]
//! disconnect()       -> disconnected        [CancelReconnect?, Close?]
//! ```

use std::time::Duration;

use crate::types::ConnectionStatus;

/// Side effect requested by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// Start a new transport connection.
    Open,
    /// Tear down the current transport connection.
    Close,
    /// Arm the reconnect timer.
    ScheduleReconnect(Duration),
    /// Disarm the pending reconnect timer.
    CancelReconnect,
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    status: ConnectionStatus,
    reconnect_delay: Duration,
    /// Caller asked to be connected and has not disconnected since.
    wants_connection: bool,
    /// A transport attempt or open socket exists.
    socket_live: bool,
    /// The single reconnect timer is armed.
    reconnect_pending: bool,
}

impl ConnectionMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            reconnect_delay,
            wants_connection: false,
            socket_live: false,
            reconnect_pending: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_socket_live(&self) -> bool {
        self.socket_live
    }

    /// Caller-initiated connect. Replaces any live socket and pending timer.
    pub fn connect(&mut self) -> Vec<ConnectionCommand> {
        let mut commands = Vec::with_capacity(3);
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(ConnectionCommand::CancelReconnect);
        }
        if self.socket_live {
            commands.push(ConnectionCommand::Close);
        }
        self.wants_connection = true;
        self.socket_live = true;
        self.status = ConnectionStatus::Connecting;
        commands.push(ConnectionCommand::Open);
        commands
    }

    /// The transport finished its handshake. Returns `true` if the status changed.
    pub fn opened(&mut self) -> bool {
        if self.socket_live && self.status == ConnectionStatus::Connecting {
            self.status = ConnectionStatus::Connected;
            true
        } else {
            false
        }
    }

    /// The transport reported an error; the socket must be closed.
    pub fn errored(&mut self) -> Option<ConnectionCommand> {
        if !self.socket_live {
            return None;
        }
        self.status = ConnectionStatus::Error;
        Some(ConnectionCommand::Close)
    }

    /// The transport closed, whether or not it was ever connected.
    pub fn closed(&mut self) -> Option<ConnectionCommand> {
        if !self.socket_live {
            return None;
        }
        self.socket_live = false;
        self.status = ConnectionStatus::Disconnected;

        if self.wants_connection && !self.reconnect_pending {
            self.reconnect_pending = true;
            Some(ConnectionCommand::ScheduleReconnect(self.reconnect_delay))
        } else {
            None
        }
    }

    /// The reconnect timer expired.
    pub fn reconnect_fired(&mut self) -> Option<ConnectionCommand> {
        if !self.reconnect_pending {
            return None;
        }
        self.reconnect_pending = false;
        if !self.wants_connection {
            return None;
        }
        self.socket_live = true;
        self.status = ConnectionStatus::Connecting;
        Some(ConnectionCommand::Open)
    }

    /// Caller-initiated teardown. Safe to call repeatedly.
    pub fn disconnect(&mut self) -> Vec<ConnectionCommand> {
        let mut commands = Vec::with_capacity(2);
        self.wants_connection = false;
        if self.reconnect_pending {
            self.reconnect_pending = false;
            commands.push(ConnectionCommand::CancelReconnect);
        }
        if self.socket_live {
            self.socket_live = false;
            commands.push(ConnectionCommand::Close);
        }
        self.status = ConnectionStatus::Disconnected;
        commands
    }
}
