//! Per-connection state machine.

/// State of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// TCP and WebSocket handshake done, not yet registered.
    Connecting,
    /// Registered and processing messages.
    Active,
    /// Deregistered (or rejected); no further messages are processed.
    Closed,
}

impl ConnectionState {
    /// Whether the session is processing messages.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Whether the session has finished.
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
