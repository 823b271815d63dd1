//! Session registry: who is connected and how to reach them.

use std::collections::HashMap;
use std::sync::Mutex;

use padlink_types::{ClientId, ServerMessage};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Registration was refused because the registry is at capacity.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("too many clients")]
pub struct RegistryFull;

/// A registered client session: the outbound channel to its writer task.
struct Session {
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

/// Tracks active client sessions and enforces the capacity limit.
///
/// All operations take the internal lock, so register, deregister, and
/// broadcast are atomic with respect to each other. Nothing awaits while
/// the lock is held.
pub struct SessionRegistry {
    max_clients: usize,
    sessions: Mutex<HashMap<ClientId, Session>>,
}

impl SessionRegistry {
    /// Create a registry admitting at most `max_clients` sessions.
    pub fn new(max_clients: usize) -> Self {
        Self {
            max_clients,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new session, allocating a fresh identity.
    ///
    /// Fails without mutating anything when the registry is full.
    pub fn register(
        &self,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ClientId, RegistryFull> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.len() >= self.max_clients {
            return Err(RegistryFull);
        }
        let id = ClientId::new();
        sessions.insert(id, Session { outbound });
        Ok(id)
    }

    /// Remove a session. Idempotent: removing an unknown or already
    /// removed id is a no-op, since deregistration can race in from more
    /// than one exit path.
    pub fn deregister(&self, id: ClientId) -> bool {
        self.sessions.lock().unwrap().remove(&id).is_some()
    }

    /// Send a message to one session. Returns `false` if the session is
    /// gone or its writer has hung up.
    pub fn send_to(&self, id: ClientId, msg: ServerMessage) -> bool {
        let sessions = self.sessions.lock().unwrap();
        match sessions.get(&id) {
            Some(session) => session.outbound.send(msg).is_ok(),
            None => false,
        }
    }

    /// Deliver a message to every registered session.
    ///
    /// A failed delivery (writer task gone) is logged and skipped; it
    /// never prevents delivery to the remaining sessions.
    pub fn broadcast(&self, msg: &ServerMessage) {
        let sessions = self.sessions.lock().unwrap();
        for (id, session) in sessions.iter() {
            if session.outbound.send(msg.clone()).is_err() {
                debug!(client = %id, "broadcast skipped dead session");
            }
        }
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
